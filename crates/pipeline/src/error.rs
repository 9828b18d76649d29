//! Engine error taxonomy
//!
//! Every failure the pipeline can surface falls into one of five kinds.
//! All of them are fatal to the run: the supervisor stores the first one,
//! cancels every component, and the caller reports it and exits non-zero.
//! Soft per-record conditions are not errors; actions log them as warnings
//! from inside their output tasks so they interleave with output in order.

use thiserror::Error;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad configuration or CLI usage, detected before any worker starts
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A well-formed record that violates an action's hard expectations
    #[error("malformed input: {0}")]
    Input(String),

    /// A record the XML parser rejected
    #[error("{file}:{start_line}-{end_line}: failed to parse record: {message}")]
    Parse {
        file: String,
        start_line: u64,
        end_line: u64,
        message: String,
    },

    /// An internal invariant violation
    #[error("internal error: {0}")]
    Bug(String),

    /// Reading an input or writing the output sink failed
    #[error("i/o error: {0}")]
    Resource(#[from] std::io::Error),
}

impl EngineError {
    /// Create an argument error
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Create an input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create an internal error
    pub fn bug(msg: impl Into<String>) -> Self {
        Self::Bug(msg.into())
    }
}
