//! Marking predicates over a fixed-width binary state space.

use keyspace_core::{Keyspace, KeyspaceError};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};

/// Flags the basis states whose phase the amplification step inverts.
pub trait Oracle {
    fn marks(&self, state: u64) -> bool;
}

impl<F> Oracle for F
where
    F: Fn(u64) -> bool,
{
    fn marks(&self, state: u64) -> bool {
        self(state)
    }
}

/// Exact membership oracle for an inclusive range `[lower, upper]`.
///
/// `marks(x)` holds iff `lower <= x <= upper`, endpoints included, for every
/// `x` of the state space. Built fresh for each search; holds no state
/// beyond the bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOracle {
    keyspace: Keyspace,
    /// `lower` narrowed to u64, or `None` when it lies above every u64 state.
    lower_state: Option<u64>,
    /// `upper` narrowed to u64, saturating.
    upper_state: u64,
}

impl RangeOracle {
    /// Build the oracle for `[lower, upper]`. Fails when `lower > upper`.
    pub fn build(lower: BigUint, upper: BigUint) -> Result<Self, KeyspaceError> {
        Ok(Self::for_keyspace(&Keyspace::new(lower, upper)?))
    }

    /// Build the oracle for an already-validated keyspace.
    pub fn for_keyspace(keyspace: &Keyspace) -> Self {
        RangeOracle {
            keyspace: keyspace.clone(),
            lower_state: keyspace.lower().to_u64(),
            upper_state: keyspace.upper().to_u64().unwrap_or(u64::MAX),
        }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Bit-width `W` derived from the upper bound.
    pub fn width(&self) -> u32 {
        self.keyspace.width()
    }

    /// The same predicate on integers of any size.
    pub fn marks_value(&self, value: &BigUint) -> bool {
        self.keyspace.contains(value)
    }

    /// Number of marked states inside `[0, 2^width)`.
    pub fn marked_count(&self, width: u32) -> BigUint {
        let last_state = (BigUint::one() << width) - BigUint::one();
        let lower = self.keyspace.lower();
        if *lower > last_state {
            return BigUint::from(0u32);
        }
        let upper = self.keyspace.upper().min(&last_state);
        upper - lower + BigUint::one()
    }
}

impl Oracle for RangeOracle {
    fn marks(&self, state: u64) -> bool {
        match self.lower_state {
            Some(lower) => lower <= state && state <= self.upper_state,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(lower: u64, upper: u64) -> RangeOracle {
        RangeOracle::build(BigUint::from(lower), BigUint::from(upper)).unwrap()
    }

    /// Exhaustively compare the oracle against `lower <= x <= upper`.
    fn assert_exact(lower: u64, upper: u64) {
        let oracle = build(lower, upper);
        let width = oracle.width();
        for x in 0..(1u64 << width) {
            assert_eq!(
                oracle.marks(x),
                lower <= x && x <= upper,
                "range [{}, {}] misclassifies {} at width {}",
                lower,
                upper,
                x,
                width
            );
        }
    }

    #[test]
    fn test_marks_exact_range() {
        let oracle = build(0x100, 0x1FF);
        assert_eq!(oracle.width(), 9);

        let marked: Vec<u64> = (0..512).filter(|&x| oracle.marks(x)).collect();
        assert_eq!(marked.len(), 256);
        assert_eq!(marked.first(), Some(&256));
        assert_eq!(marked.last(), Some(&511));
        assert!(!oracle.marks(255));
    }

    #[test]
    fn test_unaligned_ranges() {
        // Ranges that do not sit on power-of-two boundaries.
        for &(lower, upper) in &[
            (0, 0),
            (0, 1),
            (3, 3),
            (5, 12),
            (7, 9),
            (1, 254),
            (100, 300),
            (0x155, 0x2AA),
            (1000, 1023),
        ] {
            assert_exact(lower, upper);
        }
    }

    #[test]
    fn test_random_ranges_are_exact() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let a = rng.gen_range(0..2048u64);
            let b = rng.gen_range(0..2048u64);
            assert_exact(a.min(b), a.max(b));
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = RangeOracle::build(BigUint::from(10u32), BigUint::from(9u32)).unwrap_err();
        assert!(matches!(err, KeyspaceError::InvertedRange { .. }));
    }

    #[test]
    fn test_marked_count() {
        let oracle = build(0x100, 0x1FF);
        assert_eq!(oracle.marked_count(9), BigUint::from(256u32));
        // A wider space still holds the whole range.
        assert_eq!(oracle.marked_count(12), BigUint::from(256u32));
        // A narrower space clips it away entirely.
        assert_eq!(oracle.marked_count(8), BigUint::from(0u32));

        let straddling = build(200, 300);
        assert_eq!(straddling.marked_count(8), BigUint::from(56u32));
    }

    #[test]
    fn test_bounds_beyond_u64() {
        let lower = BigUint::one() << 70u32;
        let upper = &lower + BigUint::from(5u32);
        let oracle = RangeOracle::build(lower.clone(), upper.clone()).unwrap();
        assert_eq!(oracle.width(), 71);
        assert!(!oracle.marks(0));
        assert!(!oracle.marks(u64::MAX));
        assert!(oracle.marks_value(&lower));
        assert!(oracle.marks_value(&upper));
        assert!(!oracle.marks_value(&(upper + 1u32)));

        let open_top = RangeOracle::build(BigUint::from(10u32), BigUint::one() << 80u32).unwrap();
        assert!(!open_top.marks(9));
        assert!(open_top.marks(10));
        assert!(open_top.marks(u64::MAX));
    }

    #[test]
    fn test_closure_oracle() {
        let even = |x: u64| x % 2 == 0;
        assert!(even.marks(4));
        assert!(!even.marks(5));
    }
}
