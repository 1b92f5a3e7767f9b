//! Error types for the engine and its collaborators.

use thiserror::Error;

/// Errors raised while building an engine or handling a command.
///
/// Everything except [`EngineError::InvalidPattern`] and
/// [`EngineError::PatternParse`] is a configuration problem and can only
/// surface at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A seed pattern that does not match the grid it is meant for.
    #[error("pattern is {rows} rows, row {row} has {found} cells; expected {height} rows of {width}")]
    InvalidPattern {
        width: usize,
        height: usize,
        rows: usize,
        row: usize,
        found: usize,
    },

    #[error("pattern line {line}: {reason}")]
    PatternParse { line: usize, reason: String },
}

/// Failure reported by an event consumer.
///
/// The engine never propagates these; they are logged at the dispatch
/// boundary and the universe keeps evolving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("display error: {0}")]
    Display(String),

    #[error("consumer disconnected")]
    Disconnected,
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
