//! Shared types and utilities for keyspace range searches.
//!
//! A keyspace is an inclusive integer interval `[lower, upper]` handed to a
//! worker. Bounds are arbitrary-size integers (they arrive as base-16
//! literals and may exceed 64 bits); the bit-width of a keyspace is the
//! number of bits needed to represent its upper bound.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Errors raised while validating or parsing keyspace bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyspaceError {
    #[error("lower bound {lower:#x} exceeds upper bound {upper:#x}")]
    InvertedRange { lower: BigUint, upper: BigUint },

    #[error("malformed hex bound '{0}'")]
    MalformedBound(String),

    #[error("bit-width {0} cannot hold a state space")]
    InvalidWidth(u32),

    #[error("cannot split a keyspace into {0} parts")]
    InvalidPartCount(usize),
}

/// Position of a worker in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<usize> for WorkerId {
    fn from(index: usize) -> Self {
        WorkerId(index)
    }
}

/// Minimum number of bits needed to represent `upper` (1 for zero).
pub fn bit_width(upper: &BigUint) -> u32 {
    if upper.is_zero() {
        1
    } else {
        upper.bits() as u32
    }
}

/// Parse a base-16 bound such as `0x1FF`, `1ff` or `0xdead_beef`.
pub fn parse_hex_bound(text: &str) -> Result<BigUint, KeyspaceError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = digits.chars().filter(|&c| c != '_').collect();

    if digits.is_empty() {
        return Err(KeyspaceError::MalformedBound(text.to_string()));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| KeyspaceError::MalformedBound(text.to_string()))
}

/// Format a bound as a `0x`-prefixed lowercase hex literal.
pub fn format_hex_bound(value: &BigUint) -> String {
    format!("{:#x}", value)
}

/// An inclusive integer interval `[lower, upper]` with `lower <= upper`.
///
/// Immutable once built; reassignment replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyspace {
    lower: BigUint,
    upper: BigUint,
}

impl Keyspace {
    /// Validate and build a keyspace. Fails when `lower > upper`.
    pub fn new(lower: BigUint, upper: BigUint) -> Result<Self, KeyspaceError> {
        if lower > upper {
            return Err(KeyspaceError::InvertedRange { lower, upper });
        }
        Ok(Keyspace { lower, upper })
    }

    /// Build a keyspace from two base-16 literals.
    pub fn from_hex(lower: &str, upper: &str) -> Result<Self, KeyspaceError> {
        Keyspace::new(parse_hex_bound(lower)?, parse_hex_bound(upper)?)
    }

    pub fn lower(&self) -> &BigUint {
        &self.lower
    }

    pub fn upper(&self) -> &BigUint {
        &self.upper
    }

    /// Bit-width `W` of the state space that holds this keyspace.
    pub fn width(&self) -> u32 {
        bit_width(&self.upper)
    }

    /// Number of integers in the interval.
    pub fn len(&self) -> BigUint {
        &self.upper - &self.lower + BigUint::one()
    }

    /// A keyspace always holds at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        &self.lower <= value && value <= &self.upper
    }

    /// Whether the two intervals share at least one integer.
    pub fn overlaps(&self, other: &Keyspace) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    /// Divide into at most `parts` contiguous, disjoint sub-ranges that cover
    /// this keyspace exactly. Piece sizes differ by at most one and no piece
    /// is empty, so a keyspace shorter than `parts` yields one piece per element.
    pub fn split(&self, parts: usize) -> Result<Vec<Keyspace>, KeyspaceError> {
        if parts == 0 {
            return Err(KeyspaceError::InvalidPartCount(parts));
        }

        let len = self.len();
        let pieces = len.to_usize().map_or(parts, |n| n.min(parts));

        let base = &len / pieces;
        let remainder = &len % pieces;

        let mut result = Vec::with_capacity(pieces);
        let mut start = self.lower.clone();
        for i in 0..pieces {
            let mut size = base.clone();
            if BigUint::from(i) < remainder {
                size += 1u32;
            }
            let end = &start + &size - BigUint::one();
            result.push(Keyspace {
                lower: start,
                upper: end.clone(),
            });
            start = end + BigUint::one();
        }

        Ok(result)
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}-{:#x}", self.lower, self.upper)
    }
}

#[derive(Serialize, Deserialize)]
struct HexKeyspace {
    lower: String,
    upper: String,
}

impl Serialize for Keyspace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        HexKeyspace {
            lower: format_hex_bound(&self.lower),
            upper: format_hex_bound(&self.upper),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Keyspace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HexKeyspace::deserialize(deserializer)?;
        Keyspace::from_hex(&raw.lower, &raw.upper).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(&big(0)), 1);
        assert_eq!(bit_width(&big(1)), 1);
        assert_eq!(bit_width(&big(2)), 2);
        assert_eq!(bit_width(&big(255)), 8);
        assert_eq!(bit_width(&big(256)), 9);
        assert_eq!(bit_width(&big(0x1FF)), 9);
        assert_eq!(bit_width(&(BigUint::one() << 70u32)), 71);
    }

    #[test]
    fn test_parse_hex_bound() {
        assert_eq!(parse_hex_bound("0x100").unwrap(), big(256));
        assert_eq!(parse_hex_bound("0X1FF").unwrap(), big(511));
        assert_eq!(parse_hex_bound("  ff ").unwrap(), big(255));
        assert_eq!(parse_hex_bound("0xdead_beef").unwrap(), big(0xdead_beef));

        let wide = parse_hex_bound("0x2_0000_0000_0000_0000").unwrap();
        assert_eq!(wide, BigUint::one() << 65u32);

        assert!(matches!(
            parse_hex_bound("0x"),
            Err(KeyspaceError::MalformedBound(_))
        ));
        assert!(matches!(
            parse_hex_bound("0xZZ"),
            Err(KeyspaceError::MalformedBound(_))
        ));
        assert!(matches!(
            parse_hex_bound(""),
            Err(KeyspaceError::MalformedBound(_))
        ));
    }

    #[test]
    fn test_keyspace_validation() {
        let ks = Keyspace::new(big(256), big(511)).unwrap();
        assert_eq!(ks.width(), 9);
        assert_eq!(ks.len(), big(256));
        assert!(ks.contains(&big(256)));
        assert!(ks.contains(&big(511)));
        assert!(!ks.contains(&big(255)));
        assert!(!ks.contains(&big(512)));

        let single = Keyspace::new(big(7), big(7)).unwrap();
        assert_eq!(single.len(), big(1));

        let err = Keyspace::new(big(10), big(9)).unwrap_err();
        assert_eq!(
            err,
            KeyspaceError::InvertedRange {
                lower: big(10),
                upper: big(9)
            }
        );
    }

    #[test]
    fn test_overlaps() {
        let a = Keyspace::new(big(0), big(10)).unwrap();
        let b = Keyspace::new(big(10), big(20)).unwrap();
        let c = Keyspace::new(big(11), big(20)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_split_covers_exactly() {
        let ks = Keyspace::from_hex("0x100", "0x1FF").unwrap();
        let pieces = ks.split(3).unwrap();
        assert_eq!(pieces.len(), 3);

        // 256 elements over 3 parts: 86, 85, 85
        assert_eq!(pieces[0].len(), big(86));
        assert_eq!(pieces[1].len(), big(85));
        assert_eq!(pieces[2].len(), big(85));

        assert_eq!(pieces[0].lower(), ks.lower());
        assert_eq!(pieces[2].upper(), ks.upper());
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].upper() + 1u32, *pair[1].lower());
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_split_short_keyspace() {
        let ks = Keyspace::new(big(5), big(6)).unwrap();
        let pieces = ks.split(4).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], Keyspace::new(big(5), big(5)).unwrap());
        assert_eq!(pieces[1], Keyspace::new(big(6), big(6)).unwrap());

        assert_eq!(ks.split(0), Err(KeyspaceError::InvalidPartCount(0)));
    }

    #[test]
    fn test_keyspace_json() {
        let ks = Keyspace::from_hex("0x100", "0x1FF").unwrap();
        let json = serde_json::to_string(&ks).unwrap();
        assert_eq!(json, r#"{"lower":"0x100","upper":"0x1ff"}"#);

        let parsed: Keyspace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ks);

        let inverted = serde_json::from_str::<Keyspace>(r#"{"lower":"0x2","upper":"0x1"}"#);
        assert!(inverted.is_err());
    }

    #[test]
    fn test_display() {
        let ks = Keyspace::from_hex("0x100", "0x1FF").unwrap();
        assert_eq!(ks.to_string(), "0x100-0x1ff");
        assert_eq!(WorkerId(3).to_string(), "3");
    }
}
