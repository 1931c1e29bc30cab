//! Error types for auto-evo runs.
//!
//! Modeling edge cases (no room for a part, an empty niche, a mutation that
//! would leave no parts) are not errors and never show up here. These types
//! cover configuration problems, bad lookups and broken invariants.

use thiserror::Error;

use super::patch::PatchId;
use super::species::SpeciesId;

/// Errors that abort an auto-evo run or a setup step.
#[derive(Debug, Error)]
pub enum AutoEvoError {
    /// A structural invariant was broken. This is a bug, not a modeling case.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The run was cancelled between steps; nothing was committed.
    #[error("auto-evo run cancelled")]
    Cancelled,

    /// A patch id did not resolve.
    #[error("unknown patch {0:?}")]
    UnknownPatch(PatchId),

    /// A species id did not resolve.
    #[error("unknown species {0:?}")]
    UnknownSpecies(SpeciesId),

    /// A part name did not resolve in the part catalog.
    #[error("unknown part type: {0}")]
    UnknownPart(String),

    /// A membrane name did not resolve.
    #[error("unknown membrane type: {0}")]
    UnknownMembrane(String),

    /// A parameter value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised by a scoring function handed a species kind it does not model.
///
/// Callers recover by treating the pressure as scoring 0.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ScoreError {
    /// The pressure only understands unicellular organisms.
    #[error("pressure `{pressure}` cannot score a multicellular species")]
    Unscoreable {
        /// Name of the pressure kind that refused.
        pressure: &'static str,
    },
}

/// Convenience alias used across the simulation modules.
pub type Result<T, E = AutoEvoError> = std::result::Result<T, E>;
