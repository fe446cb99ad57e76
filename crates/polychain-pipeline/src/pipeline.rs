//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::simplify`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use polychain_pipeline::{Pipeline, Point, SimplifyConfig, SimplifyError};
//! # fn run(points: Vec<Point>) -> Result<(), SimplifyError> {
//! let result = Pipeline::new(points, SimplifyConfig::default())
//!     .build_dag()?
//!     .test_admissibility()?
//!     .extract_path()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying the chain session forward. The caller can inspect the current
//! stage's output via accessor methods at any point.

use serde::{Deserialize, Serialize};

use crate::admissibility::AdmissibilityReport;
use crate::chain::ChainState;
use crate::diagnostics::{StageMetrics, reduction_ratio};
use crate::shortest_path::ShortestPath;
use crate::types::{Edge, Point, Polyline, SimplifyConfig, SimplifyError};

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyResult {
    /// Configuration the run used.
    pub config: SimplifyConfig,
    /// The input chain.
    pub original: Polyline,
    /// Outcome of the shortest-path search.
    pub path: ShortestPath,
    /// The vertices of the simplified chain, in order.
    ///
    /// Empty when the last vertex was unreachable.
    pub simplified: Polyline,
    /// Shortcut edges that passed admissibility, sorted by endpoints.
    pub admissible_edges: Vec<Edge>,
}

impl SimplifyResult {
    /// Indices of the simplified chain's vertices in the input.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        self.path.indices()
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`build_dag`](Self::build_dag) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .build_dag() to continue"]
pub struct Pending {
    config: SimplifyConfig,
    points: Vec<Point>,
}

impl Pending {
    /// The input chain.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Build the chain session with every candidate edge and advance to
    /// [`DagBuilt`].
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] if the config fails
    /// validation.
    pub fn build_dag(self) -> Result<DagBuilt, SimplifyError> {
        let chain = ChainState::build_chain(&self.points, &self.config)?;
        Ok(DagBuilt {
            config: self.config,
            chain,
        })
    }
}

// ───────────────────────── Stage 1: DagBuilt ─────────────────────────

/// Pipeline state after candidate generation. Every shortcut is hidden.
#[must_use = "pipeline stages are consumed by advancing — call .test_admissibility() to continue"]
pub struct DagBuilt {
    config: SimplifyConfig,
    chain: ChainState,
}

impl DagBuilt {
    /// The chain session.
    #[must_use]
    pub const fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Candidate generation counts.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::CandidateGeneration {
            node_count: self.chain.len(),
            candidate_count: self.chain.dag().edge_count(),
            approx_count: self.chain.dag().approx_count(),
        }
    }

    /// Run the configured admissibility strategy and advance to
    /// [`Tested`].
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::Geometry`] if cone construction hits a
    /// kernel invariant violation.
    pub fn test_admissibility(mut self) -> Result<Tested, SimplifyError> {
        let report = self.chain.run(self.config.strategy)?;
        Ok(Tested {
            config: self.config,
            chain: self.chain,
            report,
        })
    }
}

// ───────────────────────── Stage 2: Tested ───────────────────────────

/// Pipeline state after admissibility testing.
#[must_use = "pipeline stages are consumed by advancing — call .extract_path() to continue"]
pub struct Tested {
    config: SimplifyConfig,
    chain: ChainState,
    report: AdmissibilityReport,
}

impl Tested {
    /// The chain session, with `show` flags set.
    #[must_use]
    pub const fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Counts from the admissibility pass.
    #[must_use]
    pub const fn report(&self) -> &AdmissibilityReport {
        &self.report
    }

    /// Admissibility counts.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Admissibility {
            strategy: self.config.strategy.label().to_string(),
            epsilon: self.config.epsilon,
            admitted_count: self.report.admitted,
            rejected_count: self.report.rejected,
            degenerate_cones: self.report.degenerate_cones,
        }
    }

    /// Find the minimum-edge path and advance to [`Extracted`].
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if a path edge is missing
    /// from the DAG.
    pub fn extract_path(mut self) -> Result<Extracted, SimplifyError> {
        let path = self.chain.compute_shortest_path()?;
        Ok(Extracted {
            config: self.config,
            chain: self.chain,
            report: self.report,
            path,
        })
    }
}

// ───────────────────────── Stage 3: Extracted ────────────────────────

/// Pipeline state after shortest-path extraction, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`SimplifyResult`].
#[must_use = "call .into_result() to extract the SimplifyResult"]
pub struct Extracted {
    config: SimplifyConfig,
    chain: ChainState,
    report: AdmissibilityReport,
    path: ShortestPath,
}

impl Extracted {
    /// The chain session, with `shortest_path` flags set.
    #[must_use]
    pub const fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Counts from the admissibility pass.
    #[must_use]
    pub const fn report(&self) -> &AdmissibilityReport {
        &self.report
    }

    /// Outcome of the search.
    #[must_use]
    pub const fn path(&self) -> &ShortestPath {
        &self.path
    }

    /// Path length counts.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let original_edge_count = self.chain.len().saturating_sub(1);
        let path_edge_count = self.path.edge_count();
        StageMetrics::ShortestPath {
            path_edge_count,
            original_edge_count,
            reduction_ratio: if self.path.is_reachable() {
                reduction_ratio(original_edge_count, path_edge_count)
            } else {
                0.0
            },
            reachable: self.path.is_reachable(),
        }
    }

    /// The simplified chain.
    #[must_use]
    pub fn simplified(&self) -> Polyline {
        let nodes = self.chain.nodes();
        Polyline::new(self.path.indices().iter().map(|&i| nodes[i].point).collect())
    }

    /// Consume the pipeline and return the [`SimplifyResult`].
    #[must_use]
    pub fn into_result(self) -> SimplifyResult {
        let simplified = self.simplified();
        SimplifyResult {
            config: self.config,
            original: self.chain.polyline(),
            path: self.path,
            simplified,
            admissible_edges: self.chain.dag().admissible_shortcuts(),
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 4;

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// ```rust
/// # use polychain_pipeline::{Pipeline, Point, SimplifyConfig, SimplifyError};
/// # use polychain_pipeline::pipeline::{Advance, Stage};
/// # fn run(points: Vec<Point>) -> Result<(), SimplifyError> {
/// let mut stage: Stage = Pipeline::new(points, SimplifyConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage.
    const NAME: &str;

    /// Zero-based index of this stage.
    const INDEX: usize;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for [`Pending`], which has done no work yet.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at the
    /// final stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError`] if the stage transition fails.
    fn next(self) -> Result<Option<Stage>, SimplifyError>;

    /// Run all remaining stages and return the final [`SimplifyResult`].
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError`] if any remaining stage fails.
    fn complete(self) -> Result<SimplifyResult, SimplifyError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, SimplifyError> {
        Ok(Some(Stage::DagBuilt(self.build_dag()?)))
    }

    fn complete(self) -> Result<SimplifyResult, SimplifyError> {
        self.build_dag()?.complete()
    }
}

impl PipelineStage for DagBuilt {
    const NAME: &str = "candidates";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, SimplifyError> {
        Ok(Some(Stage::Tested(self.test_admissibility()?)))
    }

    fn complete(self) -> Result<SimplifyResult, SimplifyError> {
        self.test_admissibility()?.complete()
    }
}

impl PipelineStage for Tested {
    const NAME: &str = "admissibility";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, SimplifyError> {
        Ok(Some(Stage::Extracted(self.extract_path()?)))
    }

    fn complete(self) -> Result<SimplifyResult, SimplifyError> {
        self.extract_path()?.complete()
    }
}

impl PipelineStage for Extracted {
    const NAME: &str = "shortest_path";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, SimplifyError> {
        Ok(None)
    }

    fn complete(self) -> Result<SimplifyResult, SimplifyError> {
        Ok(self.into_result())
    }
}

/// Type-erased pipeline stage for loop-driven execution.
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`DagBuilt`].
    DagBuilt(DagBuilt),
    /// See [`Tested`].
    Tested(Tested),
    /// See [`Extracted`].
    Extracted(Extracted),
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage and is returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::DagBuilt(s) => s.$method($($arg),*),
            Self::Tested(s) => s.$method($($arg),*),
            Self::Extracted(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// Stage-specific metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// Advance to the next stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError`] if the stage transition fails.
    pub fn next(self) -> Result<Option<Self>, SimplifyError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if already
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError`] if the stage transition fails.
    pub fn advance(self) -> Result<Advance, SimplifyError> {
        Ok(match self {
            Self::Pending(s) => Advance::Next(Self::DagBuilt(s.build_dag()?)),
            Self::DagBuilt(s) => Advance::Next(Self::Tested(s.test_admissibility()?)),
            Self::Tested(s) => Advance::Next(Self::Extracted(s.extract_path()?)),
            done @ Self::Extracted(_) => Advance::Complete(done),
        })
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError`] if any remaining stage fails.
    pub fn complete(self) -> Result<SimplifyResult, SimplifyError> {
        delegate!(self, complete)
    }
}

// Lets the macro call `.name()` and `.index()` on `&self`; the trait's
// associated constants are not reachable as `self.NAME`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<DagBuilt> for Stage {
    fn from(s: DagBuilt) -> Self {
        Self::DagBuilt(s)
    }
}

impl From<Tested> for Stage {
    fn from(s: Tested) -> Self {
        Self::Tested(s)
    }
}

impl From<Extracted> for Stage {
    fn from(s: Extracted) -> Self {
        Self::Extracted(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental simplification pipeline.
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a chain and config.
    ///
    /// No processing is performed. Call
    /// [`.build_dag()`](Pending::build_dag) (or convert to a [`Stage`] and
    /// loop) to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(points: Vec<Point>, config: SimplifyConfig) -> Pending {
        Pending { config, points }
    }
}
