use std::time::Duration;

use bytes::Bytes;
use futures::Future;
use repodrive::{path::RepoPath, sha::Sha, DirectoryEntry};

pub mod github;

/// What lives at a remote path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    Directory(Vec<DirectoryEntry>),
    File(DirectoryEntry),
}

pub trait GetContents {
    /// Lists the directory at `path`, or reads the metadata of the file at `path`.
    /// A path that does not exist yields `Error::NotFound`.
    fn get_contents(
        &self,
        path: &RepoPath,
    ) -> impl Future<Output = repodrive::Result<Contents>> + Send;
}

/// A single file write.
/// `remote_ref` must be the ref of the current version when the file already exists.
#[derive(Debug, Clone)]
pub struct PutRequest<'a> {
    pub path: &'a RepoPath,
    pub content: Bytes,
    pub message: String,
    pub remote_ref: Option<&'a Sha>,
    pub timeout: Duration,
}

pub trait PutFile {
    fn put_file(
        &self,
        req: PutRequest<'_>,
    ) -> impl Future<Output = repodrive::Result<DirectoryEntry>> + Send;
}

/// A trait to delete single files.
/// Folders exist only through their files and vanish with the last one.
pub trait DeleteFile {
    fn delete_file(
        &self,
        path: &RepoPath,
        remote_ref: &Sha,
        message: &str,
    ) -> impl Future<Output = repodrive::Result<()>> + Send;
}

/// A trait for path-based remote repositories
pub trait Storage: Clone + GetContents + PutFile + DeleteFile + Send + Sync + 'static {}

impl<T> Storage for T where T: Clone + GetContents + PutFile + DeleteFile + Send + Sync + 'static {}
