#![allow(dead_code)]

use repodrive::{
    listing::ListingPolicy, nav::DEFAULT_ROUTE_PREFIX, path::RepoPath, DirectoryEntry,
};
use repodrived::{Browser, Drive, UploadPolicy};

use crate::stubs::memory::MemoryStore;

pub struct Harness {
    pub store: MemoryStore,
    pub drive: Drive<MemoryStore>,
}

impl Harness {
    pub fn new(store: MemoryStore) -> Self {
        let drive = Drive::new(store.clone(), ListingPolicy::default(), UploadPolicy::default());
        Self { store, drive }
    }

    pub fn with_upload_policy(self, upload: UploadPolicy) -> Self {
        let drive = Drive::new(self.store.clone(), ListingPolicy::default(), upload);
        Self { drive, ..self }
    }

    pub async fn browser(&self, path: &str) -> Browser<MemoryStore> {
        Browser::mount(self.drive.clone(), RepoPath::new(path), DEFAULT_ROUTE_PREFIX).await
    }

    pub async fn list(&self, path: &str) -> Vec<DirectoryEntry> {
        self.drive
            .lister()
            .list(&RepoPath::new(path))
            .await
            .expect("Should not fail")
    }

    pub async fn entry(&self, path: &str) -> DirectoryEntry {
        self.drive
            .stat(&RepoPath::new(path))
            .await
            .expect("Should not fail")
    }
}

pub fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name()).collect()
}
