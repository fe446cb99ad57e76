//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! Every call to [`simplify_with_diagnostics`](crate::simplify_with_diagnostics)
//! collects diagnostics alongside the simplification result.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps are
//! captured via the `web-time` crate, which uses `performance.now()` on
//! WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use web_time::Instant;

use crate::pipeline::{Pipeline, SimplifyResult};
use crate::types::{Point, SimplifyConfig, SimplifyError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single simplification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifyDiagnostics {
    /// Stage 1: chain and candidate edge generation.
    pub candidate_generation: StageDiagnostics,
    /// Stage 2: admissibility testing.
    pub admissibility: StageDiagnostics,
    /// Stage 3: shortest-path extraction.
    pub shortest_path: StageDiagnostics,
    /// Total wall-clock duration of the entire run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SimplifySummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Candidate DAG generation metrics.
    CandidateGeneration {
        /// Number of chain vertices.
        node_count: usize,
        /// Total edges in the DAG, chain edges included.
        candidate_count: usize,
        /// Shortcut edges among them.
        approx_count: usize,
    },
    /// Admissibility testing metrics.
    Admissibility {
        /// Which strategy ran.
        strategy: String,
        /// Uniform tolerance in force.
        epsilon: f64,
        /// Shortcuts admitted.
        admitted_count: usize,
        /// Shortcuts rejected.
        rejected_count: usize,
        /// Cones that covered the whole plane (cone strategy only).
        degenerate_cones: usize,
    },
    /// Shortest-path extraction metrics.
    ShortestPath {
        /// Edges on the simplified chain.
        path_edge_count: usize,
        /// Edges on the original chain.
        original_edge_count: usize,
        /// `1.0 - (path / original)`.
        reduction_ratio: f64,
        /// Whether the last vertex was reached.
        reachable: bool,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifySummary {
    /// Vertices in the input chain.
    pub input_point_count: usize,
    /// Vertices in the simplified chain.
    pub output_point_count: usize,
    /// Strategy used.
    pub strategy: String,
    /// Tolerance used.
    pub epsilon: f64,
}

impl SimplifyDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Simplification Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Chain: {} points, strategy {}, epsilon {}",
            self.summary.input_point_count, self.summary.strategy, self.summary.epsilon,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Candidate Generation", &self.candidate_generation),
            ("Admissibility", &self.admissibility),
            ("Shortest Path", &self.shortest_path),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Points: {} -> {}",
            self.summary.input_point_count, self.summary.output_point_count,
        ));

        lines.join("\n")
    }
}

/// Run the pipeline, timing each stage.
///
/// Produces the same [`SimplifyResult`] as [`crate::simplify`], plus
/// per-stage durations and metrics.
///
/// # Errors
///
/// Returns [`SimplifyError`] if any stage fails.
pub fn simplify_with_diagnostics(
    points: &[Point],
    config: &SimplifyConfig,
) -> Result<(SimplifyResult, SimplifyDiagnostics), SimplifyError> {
    let total_start = Instant::now();

    let start = Instant::now();
    let built = Pipeline::new(points.to_vec(), *config).build_dag()?;
    let candidate_generation = timed(start, built.stage_metrics());

    let start = Instant::now();
    let tested = built.test_admissibility()?;
    let admissibility = timed(start, tested.stage_metrics());

    let start = Instant::now();
    let extracted = tested.extract_path()?;
    let shortest_path = timed(start, extracted.stage_metrics());

    let result = extracted.into_result();
    let diagnostics = SimplifyDiagnostics {
        candidate_generation,
        admissibility,
        shortest_path,
        total_duration: total_start.elapsed(),
        summary: SimplifySummary {
            input_point_count: result.original.len(),
            output_point_count: result.simplified.len(),
            strategy: config.strategy.label().to_string(),
            epsilon: config.epsilon,
        },
    };
    debug!(
        total_ms = duration_ms(diagnostics.total_duration),
        points_in = diagnostics.summary.input_point_count,
        points_out = diagnostics.summary.output_point_count,
        "simplification finished"
    );
    Ok((result, diagnostics))
}

/// Elapsed time since `start` together with the stage's metrics.
fn timed(start: Instant, metrics: StageMetrics) -> StageDiagnostics {
    StageDiagnostics {
        duration: start.elapsed(),
        metrics,
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::CandidateGeneration {
            node_count,
            candidate_count,
            approx_count,
        } => {
            format!("{node_count} nodes, {candidate_count} edges ({approx_count} shortcuts)")
        }
        StageMetrics::Admissibility {
            strategy,
            epsilon,
            admitted_count,
            rejected_count,
            degenerate_cones,
        } => {
            format!(
                "{strategy} eps={epsilon:.2} admitted={admitted_count} rejected={rejected_count} planes={degenerate_cones}",
            )
        }
        StageMetrics::ShortestPath {
            path_edge_count,
            original_edge_count,
            reduction_ratio,
            reachable,
        } => {
            if *reachable {
                format!(
                    "{original_edge_count}->{path_edge_count} edges ({:.1}% reduction)",
                    reduction_ratio * 100.0,
                )
            } else {
                "last vertex unreachable".to_string()
            }
        }
    }
}

/// `1.0 - (after / before)`, or `0.0` when there was nothing to reduce.
pub(crate) fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = 1.0 - after as f64 / before as f64;
    ratio
}
