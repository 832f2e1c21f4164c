//! grover-search CLI: assign keyspaces to workers and run amplified searches.
//!
//! Commands:
//!   assign-keyspace --profile-id=N [--lower-hex=0x100] [--upper-hex=0x1FF]
//!   run-grover      --profile-id=N [--iterations=2] [--seed=S] [--json]
//!   distribute      [--lower-hex=..] [--upper-hex=..]   Split a range across all workers
//!   list                                                Show assignments and overlaps
//!
//! Options:
//!   --profiles=<path>      Worker profiles file (default: profiles.json)
//!   --assignments=<path>   Keyspace assignment file (default: keyspaces.json)
//!   --max-width=<bits>     Refuse searches over wider state spaces

use std::process;

use grover_search::{AmplificationEngine, EngineConfig, KeyspacePartitioner, SearchError, SearchResult};
use keyspace_core::{parse_hex_bound, Keyspace, WorkerId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use worker_registry::{AssignmentStore, WorkerRegistry};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    AssignKeyspace,
    RunGrover,
    Distribute,
    List,
}

/// CLI configuration parsed from command-line arguments.
struct CliConfig {
    command: Command,
    profile_id: Option<usize>,
    lower_hex: String,
    upper_hex: String,
    iterations: u64,
    seed: Option<u64>,
    profiles_path: String,
    assignments_path: String,
    max_width: Option<u32>,
    json: bool,
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("--{}=", name);
    args.iter().find_map(|a| a.strip_prefix(prefix.as_str()))
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>, String> {
    match flag_value(args, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("invalid value for --{}: '{}'", name, raw)),
        None => Ok(None),
    }
}

fn parse_args() -> Result<CliConfig, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let command = match args.iter().find(|a| !a.starts_with("--")).map(String::as_str) {
        Some("assign-keyspace") => Command::AssignKeyspace,
        Some("run-grover") => Command::RunGrover,
        Some("distribute") => Command::Distribute,
        Some("list") => Command::List,
        Some(other) => return Err(format!("unknown command '{}'", other)),
        None => return Err("missing command".to_string()),
    };

    Ok(CliConfig {
        command,
        profile_id: parse_flag(&args, "profile-id")?,
        lower_hex: flag_value(&args, "lower-hex").unwrap_or("0x100").to_string(),
        upper_hex: flag_value(&args, "upper-hex").unwrap_or("0x1FF").to_string(),
        iterations: parse_flag(&args, "iterations")?.unwrap_or(2),
        seed: parse_flag(&args, "seed")?,
        profiles_path: flag_value(&args, "profiles")
            .unwrap_or("profiles.json")
            .to_string(),
        assignments_path: flag_value(&args, "assignments")
            .unwrap_or("keyspaces.json")
            .to_string(),
        max_width: parse_flag(&args, "max-width")?,
        json: args.iter().any(|a| a == "--json"),
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  grover-search assign-keyspace --profile-id=N [--lower-hex=0x100] [--upper-hex=0x1FF]");
    eprintln!("  grover-search run-grover --profile-id=N [--iterations=2] [--seed=S] [--json]");
    eprintln!("  grover-search distribute [--lower-hex=0x100] [--upper-hex=0x1FF]");
    eprintln!("  grover-search list");
    eprintln!();
    eprintln!("Options: --profiles=<path> --assignments=<path> --max-width=<bits>");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(2);
        }
    };

    let registry = WorkerRegistry::load(&config.profiles_path).unwrap_or_else(|e| fail(e));
    let store = AssignmentStore::load(&config.assignments_path).unwrap_or_else(|e| fail(e));
    let engine = AmplificationEngine::new(EngineConfig {
        max_width: config.max_width,
    });
    let mut partitioner = KeyspacePartitioner::from_assignments(engine, store);

    match config.command {
        Command::AssignKeyspace => run_assign(&config, &registry, &mut partitioner),
        Command::RunGrover => run_search(&config, &registry, &partitioner),
        Command::Distribute => run_distribute(&config, &registry, &mut partitioner),
        Command::List => run_list(&partitioner),
    }
}

fn require_worker(config: &CliConfig, registry: &WorkerRegistry) -> WorkerId {
    let id = WorkerId(
        config
            .profile_id
            .unwrap_or_else(|| fail("--profile-id is required")),
    );
    registry.get(id).unwrap_or_else(|e| fail(e));
    log::debug!("Worker {} found in {}", id, config.profiles_path);
    id
}

fn save_assignments(config: &CliConfig, partitioner: &KeyspacePartitioner) {
    let store: AssignmentStore = partitioner
        .assignments()
        .map(|(id, ks)| (id, ks.clone()))
        .collect();
    store
        .save(&config.assignments_path)
        .unwrap_or_else(|e| fail(e));
}

fn run_assign(config: &CliConfig, registry: &WorkerRegistry, partitioner: &mut KeyspacePartitioner) {
    let id = require_worker(config, registry);
    let lower = parse_hex_bound(&config.lower_hex).unwrap_or_else(|e| fail(e));
    let upper = parse_hex_bound(&config.upper_hex).unwrap_or_else(|e| fail(e));

    partitioner
        .assign(id, lower, upper)
        .unwrap_or_else(|e| fail(e));
    save_assignments(config, partitioner);

    println!(
        "Assigned keyspace {} to {} to Profile {}",
        config.lower_hex, config.upper_hex, id
    );
}

fn run_search(config: &CliConfig, registry: &WorkerRegistry, partitioner: &KeyspacePartitioner) {
    let id = require_worker(config, registry);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match partitioner.search_assigned(id, config.iterations, &mut rng) {
        Ok(result) => {
            if config.json {
                // Streamed: the distribution has 2^W entries.
                if let Err(e) = serde_json::to_writer_pretty(std::io::stdout().lock(), &result) {
                    fail(e);
                }
                println!();
            } else {
                print_result(id, &result);
            }
        }
        Err(SearchError::NoKeyspace(_)) => {
            println!("Profile {} does not have an assigned keyspace.", id);
            process::exit(1);
        }
        Err(e) => fail(e),
    }
}

fn print_result(id: WorkerId, result: &SearchResult) {
    println!("Results for Profile {}:", id);
    println!("  State space:          2^{} states", result.width);
    println!("  Marked states:        {}", result.marked_count);
    println!(
        "  Iterations:           {} (optimal {})",
        result.iterations, result.optimal_iterations
    );
    println!(
        "  Best candidate:       {:#x} ({})",
        result.best_candidate,
        result.best_candidate_bits()
    );
    println!("  In keyspace:          {}", result.oracle_evaluation);
    println!("  Confidence:           {:.6}", result.confidence);
    println!("  Success probability:  {:.6}", result.success_probability);
    println!("  Top measurement:      {}", result.top_measurement);

    println!();
    println!("  {:>width$}  {:>12}", "State", "Probability", width = result.width as usize);
    for (state, p) in result.raw_distribution.top(8) {
        println!(
            "  {:0width$b}  {:>12.6}",
            state,
            p,
            width = result.width as usize
        );
    }
}

fn run_distribute(
    config: &CliConfig,
    registry: &WorkerRegistry,
    partitioner: &mut KeyspacePartitioner,
) {
    let keyspace = Keyspace::from_hex(&config.lower_hex, &config.upper_hex).unwrap_or_else(|e| fail(e));
    let workers: Vec<WorkerId> = registry.worker_ids().collect();

    let assigned = partitioner
        .distribute(&workers, &keyspace)
        .unwrap_or_else(|e| fail(e));
    save_assignments(config, partitioner);

    println!("Split {} across {} workers:", keyspace, assigned.len());
    for (id, piece) in &assigned {
        println!("  Profile {:>3}: {}", id, piece);
    }
}

fn run_list(partitioner: &KeyspacePartitioner) {
    if partitioner.is_empty() {
        println!("No keyspaces assigned.");
        return;
    }
    println!("{:>8}  {:>6}  {}", "Profile", "Bits", "Keyspace");
    println!("{}", "-".repeat(40));
    for (id, keyspace) in partitioner.assignments() {
        println!("{:>8}  {:>6}  {}", id, keyspace.width(), keyspace);
    }

    let overlaps = partitioner.overlapping_pairs();
    if !overlaps.is_empty() {
        println!();
        for (a, b) in overlaps {
            println!("  warning: profiles {} and {} overlap", a, b);
        }
    }
}
