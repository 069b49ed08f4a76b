//! Unified error types for the subsetting pipeline
//!
//! [`CatsError`] covers every failure a run can hit: unreadable inputs,
//! tables missing required columns, a service area that yields no connected
//! network, and foreign keys that escaped the bus renumbering. Errors raised
//! inside a pipeline stage are wrapped in [`CatsError::Stage`] so the
//! user-facing message names the stage that failed.
//!
//! # Example
//!
//! ```ignore
//! use cats_core::{CatsError, CatsResult, Stage};
//!
//! fn select(area: &Area) -> CatsResult<()> {
//!     let selection = select_area(area, &lines, &buses)
//!         .map_err(|err| err.in_stage(Stage::AreaSelection))?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Pipeline stage labels used in error messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    AreaSelection,
    LoadReduction,
    Variability,
    Reindex,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Load => "table loading",
            Stage::AreaSelection => "area selection",
            Stage::LoadReduction => "load reduction",
            Stage::Variability => "capacity-factor reconciliation",
            Stage::Reindex => "bus reindexing",
            Stage::Write => "output writing",
        };
        f.write_str(label)
    }
}

/// Unified error type for all subsetting operations.
#[derive(Error, Debug)]
pub enum CatsError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparsable values
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required column is absent from an input table
    #[error("Schema error: {table} is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors, including a service area with no connected network
    #[error("Configuration error: {0}")]
    Config(String),

    /// A foreign key that is not covered by the bus index map
    #[error("Referential integrity violation: {0}")]
    Integrity(String),

    /// Any error raised while running a named stage
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<CatsError>,
    },

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl CatsError {
    /// Attach the failing stage, leaving already-labelled errors untouched.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            CatsError::Stage { .. } => self,
            other => CatsError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            CatsError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using CatsError.
pub type CatsResult<T> = Result<T, CatsError>;

// Conversion from anyhow::Error; a CatsError somewhere in the chain keeps its kind
impl From<anyhow::Error> for CatsError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CatsError>() {
            Ok(inner) => inner,
            Err(err) => CatsError::Other(format!("{err:#}")),
        }
    }
}

impl From<String> for CatsError {
    fn from(s: String) -> Self {
        CatsError::Other(s)
    }
}

impl From<&str> for CatsError {
    fn from(s: &str) -> Self {
        CatsError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CatsError {
    fn from(err: serde_json::Error) -> Self {
        CatsError::Parse(err.to_string())
    }
}
