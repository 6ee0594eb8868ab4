//! Read side of the drive: directory listings with display rules applied.

use std::sync::Arc;

use repodrive::{
    listing::{sort_entries, ListingPolicy},
    path::RepoPath,
    DirectoryEntry, Error,
};

use crate::storage::{Contents, GetContents};

#[derive(Debug, Clone)]
pub struct Lister<S> {
    storage: S,
    policy: Arc<ListingPolicy>,
}

impl<S> Lister<S> {
    pub fn new(storage: S, policy: ListingPolicy) -> Self {
        Self {
            storage,
            policy: Arc::new(policy),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn policy(&self) -> &ListingPolicy {
        &self.policy
    }
}

impl<S> Lister<S>
where
    S: GetContents + Send + Sync,
{
    /// The entries shown to the user: ordered, with hidden entries removed.
    /// A missing directory lists as empty.
    pub async fn list(&self, path: &RepoPath) -> repodrive::Result<Vec<DirectoryEntry>> {
        let entries = self.fetch(path).await?;
        Ok(self.policy.apply(entries))
    }

    /// Every entry of the directory, ordered but unfiltered.
    pub async fn list_all(&self, path: &RepoPath) -> repodrive::Result<Vec<DirectoryEntry>> {
        let mut entries = self.fetch(path).await?;
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn fetch(&self, path: &RepoPath) -> repodrive::Result<Vec<DirectoryEntry>> {
        match self.storage.get_contents(path).await {
            Ok(Contents::Directory(entries)) => {
                log::trace!("{path}: {} entries", entries.len());
                Ok(entries)
            }
            Ok(Contents::File(_)) => {
                log::debug!("{path} is a file, listing it as empty");
                Ok(Vec::new())
            }
            Err(Error::NotFound(_)) => {
                log::debug!("{path} not found, listing it as empty");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}
