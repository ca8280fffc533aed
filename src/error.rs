//! Error types for urn simulation.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, UrnError>;

/// Errors that can occur while configuring, running or exporting simulations.
#[derive(Debug, Error)]
pub enum UrnError {
    /// A run needs at least one round.
    #[error("n_rounds must be positive")]
    ZeroRounds,

    /// A batch needs at least one run.
    #[error("n_runs must be positive")]
    ZeroRuns,

    /// No colors at all.
    #[error("initial balls cannot be empty")]
    EmptyUrn,

    /// Every color starts with zero balls, so shares are undefined.
    #[error("initial balls must contain at least one positive count")]
    NoPositiveCount,

    /// The rule's transformed weights do not form a distribution.
    #[error("draw weights sum to {sum}; cannot sample a color")]
    DegenerateWeights { sum: f64 },

    /// Ball counts would not fit in a `u64`.
    #[error("ball count overflows u64")]
    CountOverflow,

    /// A run in the batch has no recorded rounds.
    #[error("run {run_id} has no recorded rounds")]
    EmptyTrajectory { run_id: usize },

    /// Two runs share an identifier.
    #[error("run id {run_id} appears more than once in the batch")]
    DuplicateRunId { run_id: usize },

    /// Requested run is not in the batch.
    #[error("run {run_id} not found in batch")]
    UnknownRunId { run_id: usize },

    /// Requested color does not exist in the urn.
    #[error("color {color} out of range for {n_colors} colors")]
    ColorOutOfRange { color: usize, n_colors: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (scenario file or summary) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
