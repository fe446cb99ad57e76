//! polychain-bench: CLI tool for simplification parameter experimentation
//! and diagnostics.
//!
//! Runs the simplification pipeline on a chain read from a JSON file (or
//! the built-in nine-point demonstration chain) with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Comparing admissibility strategies (Iri–Imai vs. cone intersection)
//! - Seeing how epsilon changes the admitted shortcuts and path length
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin polychain-bench -- [OPTIONS] [POINTS_JSON]
//! ```
//!
//! `POINTS_JSON` holds an array of `{"x": .., "y": ..}` objects.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use polychain_pipeline::diagnostics::SimplifyDiagnostics;
use polychain_pipeline::{AdmissibilityKind, Point, SimplifyConfig};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

/// Polygonal chain simplification experimentation and diagnostics.
///
/// Builds the candidate shortcut DAG, tests admissibility, extracts the
/// fewest-edge path, and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "polychain-bench", version)]
struct Cli {
    /// Path to a JSON array of points. Uses the built-in demonstration
    /// chain when omitted.
    points_path: Option<PathBuf>,

    /// Uniform error tolerance.
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Admissibility strategy.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_STRATEGY)]
    strategy: Strategy,

    /// Run both strategies and report whether their admitted sets agree.
    #[arg(long)]
    compare: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full simplification config as a JSON string.
    ///
    /// When provided, `--epsilon` and `--strategy` are ignored.
    /// The JSON must be a valid `SimplifyConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Admissibility strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Exact strip test against every skipped vertex.
    IriImai,
    /// Toussaint-style forward/backward cone intersection.
    Cone,
}

/// Maps an [`AdmissibilityKind`] to the local CLI [`Strategy`] enum.
const fn strategy_from_pipeline(kind: AdmissibilityKind) -> Strategy {
    match kind {
        AdmissibilityKind::IriImai => Strategy::IriImai,
        AdmissibilityKind::Cone => Strategy::Cone,
    }
}

/// The CLI default strategy, derived from
/// [`SimplifyConfig::DEFAULT_STRATEGY`] so the two cannot silently diverge.
const CLI_DEFAULT_STRATEGY: Strategy = strategy_from_pipeline(SimplifyConfig::DEFAULT_STRATEGY);

/// The chain used when no points file is given.
const DEMO_CHAIN: [(f64, f64); 9] = [
    (30.0, 70.0),
    (20.0, 55.0),
    (19.0, 37.0),
    (25.0, 41.0),
    (40.0, 45.0),
    (50.0, 41.0),
    (60.0, 45.0),
    (80.0, 40.0),
    (70.0, 80.0),
];

/// Build a [`SimplifyConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<SimplifyConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SimplifyConfig {
        epsilon: cli.epsilon,
        strategy: match cli.strategy {
            Strategy::IriImai => AdmissibilityKind::IriImai,
            Strategy::Cone => AdmissibilityKind::Cone,
        },
        ..SimplifyConfig::default()
    })
}

/// Load the chain from the points file, or fall back to the demo chain.
fn load_points(cli: &Cli) -> Result<Vec<Point>, String> {
    let Some(ref path) = cli.points_path else {
        return Ok(DEMO_CHAIN.iter().map(|&(x, y)| Point::new(x, y)).collect());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

/// Install a stderr fmt subscriber at the level chosen by `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let points = match load_points(&cli) {
        Ok(points) => points,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Chain: {} ({} points)",
        cli.points_path
            .as_ref()
            .map_or_else(|| "built-in demo".to_string(), |p| p.display().to_string()),
        points.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    if cli.compare {
        return compare_strategies(&points, &config);
    }

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match polychain_pipeline::simplify_with_diagnostics(&points, &config) {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Path on the first run only.
                if run == 0 && !cli.json {
                    if result.path.is_reachable() {
                        println!("Path: {:?}", result.indices());
                    } else {
                        println!("Path: last vertex unreachable");
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("cannot simplify this chain/epsilon combination: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Run both strategies on the same chain and report where they differ.
fn compare_strategies(points: &[Point], config: &SimplifyConfig) -> ExitCode {
    let mut outcomes = Vec::with_capacity(2);
    for strategy in [AdmissibilityKind::IriImai, AdmissibilityKind::Cone] {
        let config = SimplifyConfig { strategy, ..*config };
        match polychain_pipeline::simplify(points, &config) {
            Ok(result) => {
                let admitted: Vec<(usize, usize)> = result
                    .admissible_edges
                    .iter()
                    .map(|e| (e.source, e.target))
                    .collect();
                info!(strategy = strategy.label(), admitted = admitted.len(), "strategy done");
                println!("{:<10} path={:?}", strategy.label(), result.indices());
                println!("{:<10} admitted={admitted:?}", "");
                outcomes.push(admitted);
            }
            Err(e) => {
                eprintln!("cannot simplify this chain/epsilon combination: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let [iri_imai, cone] = outcomes.as_slice() {
        let only_iri_imai: Vec<_> = iri_imai.iter().filter(|e| !cone.contains(e)).collect();
        let only_cone: Vec<_> = cone.iter().filter(|e| !iri_imai.contains(e)).collect();
        if only_iri_imai.is_empty() && only_cone.is_empty() {
            println!("Strategies agree.");
        } else {
            println!("Only iri-imai: {only_iri_imai:?}");
            println!("Only cone:     {only_cone:?}");
        }
    }

    ExitCode::SUCCESS
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&SimplifyDiagnostics) -> std::time::Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SimplifyDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Candidate Generation", |d| d.candidate_generation.duration),
        ("Admissibility", |d| d.admissibility.duration),
        ("Shortest Path", |d| d.shortest_path.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_default_matches_config_default() {
        let cli = Cli::parse_from(["polychain-bench"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, SimplifyConfig::default());
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from(["polychain-bench", "--epsilon", "4.5", "--strategy", "cone"]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.epsilon - 4.5).abs() < f64::EPSILON);
        assert_eq!(config.strategy, AdmissibilityKind::Cone);
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = serde_json::to_string(&SimplifyConfig {
            epsilon: 2.0,
            ..SimplifyConfig::default()
        })
        .unwrap();
        let cli = Cli::parse_from(["polychain-bench", "--epsilon", "7", "--config-json", &json]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.epsilon - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = Cli::parse_from(["polychain-bench", "--config-json", "{"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn demo_chain_when_no_path() {
        let cli = Cli::parse_from(["polychain-bench"]);
        let points = load_points(&cli).unwrap();
        assert_eq!(points.len(), 9);
        assert_eq!(points[8], Point::new(70.0, 80.0));
    }

    #[test]
    fn runs_must_be_positive() {
        assert!(Cli::try_parse_from(["polychain-bench", "--runs", "0"]).is_err());
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::parse_from(["polychain-bench", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
