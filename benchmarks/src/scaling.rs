//! amplification-sweep: empirical success rate vs iteration count.
//!
//! Options:
//!   --lower-hex=<hex>     Keyspace lower bound (default: 0xA5)
//!   --upper-hex=<hex>     Keyspace upper bound (default: 0xA5)
//!   --trials=<N>          Seeded searches per point (default: 500)
//!   --seed=<u64>          Base seed (default: 12345)
//!   --points=0,3,6        Iteration counts (default: 0, optimal/2, optimal, 2*optimal)
//!   --max-width=<bits>    Refuse wider state spaces (default: 20)
//!   --out=<path>          Also write the report as JSON

use benchmarks::{optimum_probes, sweep};
use grover_search::{optimal_iterations, AmplificationEngine, EngineConfig, RangeOracle};
use keyspace_core::Keyspace;
use num_traits::ToPrimitive;

struct CliConfig {
    lower_hex: String,
    upper_hex: String,
    trials: u64,
    seed: u64,
    points: Option<Vec<u64>>,
    max_width: u32,
    out: Option<String>,
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("--{}=", name);
    args.iter().find_map(|a| a.strip_prefix(prefix.as_str()))
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid value for --{}: '{}'", name, raw))
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>, String> {
    flag_value(args, name)
        .map(|raw| parse_value(name, raw))
        .transpose()
}

fn parse_points(raw: &str) -> Result<Vec<u64>, String> {
    raw.split(',').map(|s| parse_value("points", s)).collect()
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    Ok(CliConfig {
        lower_hex: flag_value(args, "lower-hex").unwrap_or("0xA5").to_string(),
        upper_hex: flag_value(args, "upper-hex").unwrap_or("0xA5").to_string(),
        trials: parse_flag(args, "trials")?.unwrap_or(500),
        seed: parse_flag(args, "seed")?.unwrap_or(12345),
        points: flag_value(args, "points").map(parse_points).transpose()?,
        max_width: parse_flag(args, "max-width")?.unwrap_or(20),
        out: flag_value(args, "out").map(str::to_string),
    })
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let keyspace = match Keyspace::from_hex(&config.lower_hex, &config.upper_hex) {
        Ok(ks) => ks,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let engine = AmplificationEngine::new(EngineConfig {
        max_width: Some(config.max_width),
    });

    let points = config.points.clone().unwrap_or_else(|| {
        let width = keyspace.width();
        let marked = RangeOracle::for_keyspace(&keyspace)
            .marked_count(width)
            .to_u64()
            .unwrap_or(u64::MAX);
        let optimal = optimal_iterations(width, marked).unwrap_or(0);
        let mut probes = vec![0];
        probes.extend(optimum_probes(optimal));
        probes.dedup();
        probes
    });

    println!("================================================================");
    println!("  AMPLIFICATION SWEEP: {} ({} bits)", keyspace, keyspace.width());
    println!("================================================================\n");

    let report = match sweep(&engine, &keyspace, &points, config.trials, config.seed) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("  Marked states:      {}", report.marked_count);
    println!("  Optimal iterations: {}", report.optimal_iterations);
    println!("  Trials per point:   {}\n", config.trials);
    println!(
        "  {:>10}  {:>10}  {:>12}  {:>12}",
        "Iterations", "Hits", "Empirical", "Theory"
    );
    println!("  {}", "-".repeat(50));
    for p in &report.points {
        println!(
            "  {:>10}  {:>10}  {:>12.4}  {:>12.4}",
            p.iterations, p.hits, p.empirical_hit_rate, p.theoretical_success_probability
        );
    }
    println!("\n  Wall time: {:.2}s", report.wall_seconds);

    if let Some(path) = &config.out {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("  Report saved to {}", path),
            Err(e) => {
                eprintln!("Failed to write {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = parse_args(&[]).unwrap();
        assert_eq!(config.lower_hex, "0xA5");
        assert_eq!(config.trials, 500);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.max_width, 20);
        assert!(config.points.is_none());
        assert!(config.out.is_none());
    }

    #[test]
    fn test_parses_flags() {
        let config = parse_args(&args(&["--trials=40", "--points=0, 3,6", "--seed=9"])).unwrap();
        assert_eq!(config.trials, 40);
        assert_eq!(config.seed, 9);
        assert_eq!(config.points, Some(vec![0, 3, 6]));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = parse_args(&args(&["--trials=abc"])).err().unwrap();
        assert!(err.contains("--trials"), "{}", err);
        assert!(parse_args(&args(&["--points=1,x,3"])).is_err());
        assert!(parse_args(&args(&["--points="])).is_err());
        assert!(parse_args(&args(&["--max-width=-1"])).is_err());
    }
}
