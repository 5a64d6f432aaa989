use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpiError` and maps to other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    IllegalGlobalPropertyValue(String),
    InvalidContact(String),
    ReportError(String),
    EpiError(String),
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl From<csv::Error> for EpiError {
    fn from(error: csv::Error) -> Self {
        EpiError::CsvError(error)
    }
}

impl From<String> for EpiError {
    fn from(error: String) -> Self {
        EpiError::EpiError(error)
    }
}

impl From<&str> for EpiError {
    fn from(error: &str) -> Self {
        EpiError::EpiError(error.to_string())
    }
}

impl std::error::Error for EpiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiError::IoError(error) => Some(error),
            EpiError::JsonError(error) => Some(error),
            EpiError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}
