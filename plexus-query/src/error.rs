//! Error and result types for the query crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed pattern text. Fatal at parse time; carries the position of
    /// the offending token.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Well-formed pattern using a construct the engine does not execute.
    #[error("unsupported pattern: {0}")]
    Plan(String),

    /// RETURN validation failure: unknown variable or duplicate alias.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// Contradictory call options (e.g. a single start id and a start list).
    #[error("invalid usage: {0}")]
    Usage(String),
}

impl Error {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}
