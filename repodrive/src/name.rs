//! Validation of names given to new folders and uploaded files.

use crate::{Error, Result};

pub const MAX_NAME_LEN: usize = 255;

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Checks that `name` can be used as a single path component.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(name, "name cannot be empty"));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(invalid(name, "name cannot contain control characters"));
    }
    if name.contains(FORBIDDEN_CHARS) {
        return Err(invalid(
            name,
            "name contains invalid characters, avoid < > : \" | ? *",
        ));
    }
    if name.starts_with('.') {
        return Err(invalid(name, "name cannot start with a dot"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid(name, "name cannot contain path separators"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(name, "name is too long (max 255 characters)"));
    }
    Ok(())
}
