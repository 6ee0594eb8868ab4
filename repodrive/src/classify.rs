//! Content type inference from file names and declared media types.
//!
//! Declared media types coming from browsers and operating systems are not
//! reliable (markdown in particular is often sent as `text/plain`), so the
//! extension is always checked too.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi", "wmv", "flv", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Markdown,
    Pdf,
    Image,
    Video,
    Generic,
}

impl FileKind {
    /// Whether files of this kind are accepted for upload and previewed in-app.
    pub fn is_supported(self) -> bool {
        self != FileKind::Generic
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Markdown => "Markdown",
            FileKind::Pdf => "PDF",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Generic => "file",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower-cased extension of `name`, if it has one.
pub fn extension(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// Infers the kind of a file. First matching rule wins.
pub fn classify(name: &str, declared: Option<&str>) -> FileKind {
    let ext = extension(name);
    let ext = ext.as_deref().unwrap_or("");
    let declared = declared
        .map(|mt| mt.trim().to_ascii_lowercase())
        .filter(|mt| !mt.is_empty());
    let declared = declared.as_deref().unwrap_or("");

    if MARKDOWN_EXTENSIONS.contains(&ext)
        || name.eq_ignore_ascii_case(crate::FOLDER_PLACEHOLDER)
        || declared.contains("markdown")
        || declared == "text/plain"
    {
        FileKind::Markdown
    } else if declared == "application/pdf" || ext == "pdf" {
        FileKind::Pdf
    } else if declared.starts_with("image/") || IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::Image
    } else if declared.starts_with("video/") || VIDEO_EXTENSIONS.contains(&ext) {
        FileKind::Video
    } else {
        FileKind::Generic
    }
}
