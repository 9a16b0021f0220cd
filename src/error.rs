use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `StrideError` and maps to other errors to
/// convert to a `StrideError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum StrideError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    DateError(chrono::ParseError),
    ConfigError(String),
    PopulationError(String),
    CheckpointError(String),
    ThreadPoolError(String),
    StrideError(String),
}

impl From<io::Error> for StrideError {
    fn from(error: io::Error) -> Self {
        StrideError::IoError(error)
    }
}

impl From<serde_json::Error> for StrideError {
    fn from(error: serde_json::Error) -> Self {
        StrideError::JsonError(error)
    }
}

impl From<csv::Error> for StrideError {
    fn from(error: csv::Error) -> Self {
        StrideError::CSVError(error)
    }
}

impl From<chrono::ParseError> for StrideError {
    fn from(error: chrono::ParseError) -> Self {
        StrideError::DateError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for StrideError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        StrideError::ThreadPoolError(error.to_string())
    }
}

impl From<String> for StrideError {
    fn from(error: String) -> Self {
        StrideError::StrideError(error)
    }
}

impl From<&str> for StrideError {
    fn from(error: &str) -> Self {
        StrideError::StrideError(error.to_string())
    }
}

impl std::error::Error for StrideError {}

impl Display for StrideError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}
