use serde::{Deserialize, Serialize};

use crate::{
    classify::{self, FileKind},
    path::RepoPath,
    sha::{Sha, ShaBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One row of a directory listing.
///
/// Directories never carry a size. The remote ref is only known once the
/// entry was fetched from the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    name: String,
    path: RepoPath,
    kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_ref: Option<ShaBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view_url: Option<String>,
}

impl DirectoryEntry {
    pub fn directory(path: RepoPath) -> Self {
        Self {
            name: path.file_name().unwrap_or_default().to_string(),
            path,
            kind: EntryKind::Directory,
            remote_ref: None,
            size: None,
            view_url: None,
        }
    }

    pub fn file(path: RepoPath, size: u64) -> Self {
        Self {
            name: path.file_name().unwrap_or_default().to_string(),
            path,
            kind: EntryKind::File,
            remote_ref: None,
            size: Some(size),
            view_url: None,
        }
    }

    pub fn with_remote_ref(self, remote_ref: ShaBuf) -> Self {
        Self {
            remote_ref: Some(remote_ref),
            ..self
        }
    }

    pub fn with_view_url(self, view_url: Option<String>) -> Self {
        Self { view_url, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &RepoPath {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn remote_ref(&self) -> Option<&Sha> {
        self.remote_ref.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn view_url(&self) -> Option<&str> {
        self.view_url.as_deref()
    }

    /// Classification of a file entry from its name, `None` for directories.
    pub fn file_kind(&self) -> Option<FileKind> {
        match self.kind {
            EntryKind::Directory => None,
            EntryKind::File => Some(classify::classify(&self.name, None)),
        }
    }
}
