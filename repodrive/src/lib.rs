use std::fmt;

use serde::{Deserialize, Serialize};

pub mod classify;
pub mod config;
pub mod listing;
pub mod loc;
pub mod name;
pub mod nav;
pub mod path;
pub mod raw_url;
pub mod sha;

mod entry;
mod error;

pub use crate::classify::FileKind;
pub use crate::config::Config;
pub use crate::entry::*;
pub use crate::error::*;

/// Hard per-file ceiling of the backing store, in bytes (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Name of the placeholder file that materializes a folder.
pub const FOLDER_PLACEHOLDER: &str = "README.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    GitHub,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::GitHub => f.write_str("GitHub"),
        }
    }
}
