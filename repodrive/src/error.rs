use std::{error, fmt, io, string::FromUtf8Error};

use byte_unit::{Byte, UnitType};
use serde::{Deserialize, Serialize};

use crate::path::RepoPath;

/// Outcome of a recursive folder delete.
///
/// The backing store has no atomic recursive delete, so files are removed one
/// by one and nothing is restored when one of them fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub succeeded: Vec<RepoPath>,
    pub failed: Vec<(RepoPath, String)>,
    pub not_attempted: Vec<RepoPath>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_attempted.is_empty()
    }

    /// Paths that were not deleted, failed ones first.
    pub fn needs_attention(&self) -> Vec<&RepoPath> {
        self.failed
            .iter()
            .map(|(path, _)| path)
            .chain(self.not_attempted.iter())
            .collect()
    }
}

impl fmt::Display for DeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deleted", self.succeeded.len())?;
        for (path, reason) in self.failed.iter() {
            write!(f, ", failed {path} ({reason})")?;
        }
        if !self.not_attempted.is_empty() {
            write!(f, ", {} not attempted", self.not_attempted.len())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Error {
    NotFound(RepoPath),
    RemoteUnavailable { status: u16, message: String },
    InvalidName { name: String, reason: String },
    UnsupportedKind { name: String },
    TooLarge { name: String, size: u64, limit: u64 },
    Conflict { path: RepoPath, message: String },
    Stale { path: RepoPath, message: String },
    Timeout { path: RepoPath, secs: u64 },
    PartialFailure(DeleteReport),
    Config(String),
    Io(String),
    Api(String),
    Other(String),
}

impl Error {
    /// Whether the operation may have been applied remotely despite the error.
    pub fn maybe_applied(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::PartialFailure(..))
    }
}

fn human_size(size: u64) -> String {
    let size = Byte::from_u64(size).get_appropriate_unit(UnitType::Binary);
    format!("{size:.2}")
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) if path.is_root() => f.write_str("Repository root not found"),
            Self::NotFound(path) => write!(f, "No such entry: {path}"),
            Self::RemoteUnavailable { status, message } => {
                write!(f, "Remote returned {status}: {message}")
            }
            Self::InvalidName { name, reason } => write!(f, "Invalid name '{name}': {reason}"),
            Self::UnsupportedKind { name } => write!(
                f,
                "Unsupported file type for '{name}': only PDF, Markdown, image and video files are accepted"
            ),
            Self::TooLarge { name, size, limit } => write!(
                f,
                "File '{name}' is {} and exceeds the limit of {}",
                human_size(*size),
                human_size(*limit)
            ),
            Self::Conflict { path, message } => write!(f, "Conflict on {path}: {message}"),
            Self::Stale { path, message } => {
                write!(f, "{path} changed since it was listed: {message}")
            }
            Self::Timeout { path, secs } => write!(
                f,
                "Write of {path} timed out after {secs}s, it may still have been applied"
            ),
            Self::PartialFailure(report) => write!(f, "Partial failure: {report}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Api(msg) => write!(f, "API error: {msg}"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl error::Error for Error {}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Self::Io(format!(
            "Non UTF-8 string: {}",
            String::from_utf8_lossy(&value.into_bytes())
        ))
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! api_error {
    ($($t:tt)*) => {
        $crate::Error::Api(format!($($t)*))
    };
}

#[macro_export]
macro_rules! config_error {
    ($($t:tt)*) => {
        $crate::Error::Config(format!($($t)*))
    };
}
