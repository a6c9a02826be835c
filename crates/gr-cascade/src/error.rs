//! Error types for the cascade engine

use thiserror::Error;

use crate::grid::Position;

/// Configuration errors.
///
/// Raised once, when an [`EngineConfig`](crate::EngineConfig) or one of its
/// tables is validated. A spin never produces one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Symbol table is empty")]
    EmptySymbolTable,

    #[error("Duplicate symbol id: {0}")]
    DuplicateSymbol(u32),

    #[error("Symbol {0} has zero weight")]
    ZeroWeight(u32),

    #[error("Symbol table needs at least 2 regular symbols with weight, found {0}")]
    TooFewRegularSymbols(usize),

    #[error("More than one symbol has the {0} role")]
    DuplicateRole(&'static str),

    #[error("Unknown symbol id: {0}")]
    UnknownSymbol(u32),

    #[error("Selector has no drawable entries")]
    EmptySelector,

    #[error("Invalid grid size: {0}")]
    InvalidGridSize(usize),

    #[error("Minimum match size must be at least 3, got {0}")]
    InvalidMinMatch(usize),

    #[error("Combo multiplier table has {len} entries but max cascade depth is {depth}")]
    MultiplierTableTooShort { len: usize, depth: usize },

    #[error("Combo multiplier table must be non-decreasing (index {0})")]
    MultiplierNotMonotonic(usize),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),
}

/// Errors that abort a single spin.
///
/// These are invariant violations, not recoverable conditions: the caller
/// never receives a partially resolved grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cascade depth exceeded safety cap of {0} steps")]
    CascadeDepthExceeded(usize),

    #[error("Cell {0} left empty after refill")]
    EmptyCell(Position),

    #[error("Grid holds unknown symbol id {id} at {position}")]
    UnknownSymbol { id: u32, position: Position },

    #[error("Grid is {actual}x{actual}, engine expects {expected}x{expected}")]
    GridSizeMismatch { expected: usize, actual: usize },
}

/// Result type alias
pub type EngineResult<T> = Result<T, EngineError>;
