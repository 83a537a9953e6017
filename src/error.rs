// src/error.rs

use std::fmt;
use thiserror::Error;

/// Which outbound call a [`Error::Remote`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    StructuredAnswer,
    Narrative,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::StructuredAnswer => "structured-answer",
            Stage::Narrative => "narrative",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// Source text is not a well-formed delimited table.
    #[error("format error: {0}")]
    Format(String),

    /// A remote payload did not have the expected shape.
    #[error("schema error: {0}")]
    Schema(String),

    /// A required credential is absent. Carries the variable name.
    #[error("configuration error: {0} is not set")]
    MissingCredential(&'static str),

    #[error("configuration error: invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("{stage} call failed: {message}")]
    Remote { stage: Stage, message: String },

    #[error("table has no columns")]
    EmptyTable,

    #[error("query is empty")]
    EmptyQuery,

    #[error("input error: {0}")]
    Input(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn remote(stage: Stage, message: impl fmt::Display) -> Self {
        Error::Remote {
            stage,
            message: message.to_string(),
        }
    }

    /// True when the caller's own request is at fault (HTTP 400 territory).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::EmptyQuery)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
