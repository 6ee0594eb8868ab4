//! Write side of the drive: folder creation, uploads and deletions.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use camino::Utf8Path;
use repodrive::{
    classify::classify,
    config::{Config, UploadConfig},
    listing::ListingPolicy,
    name::validate_name,
    path::RepoPath,
    sha::{Sha, ShaBuf},
    DeleteReport, DirectoryEntry, Error, FileKind, FOLDER_PLACEHOLDER, MAX_FILE_SIZE,
};

use crate::{
    lister::Lister,
    poller::{MutationKind, PendingMutation},
    storage::{Contents, PutRequest, Storage},
};

const MIB: u64 = 1024 * 1024;

/// Timeout of a single write: one minute, plus one second per started MiB.
pub fn upload_timeout(size: u64) -> Duration {
    Duration::from_secs(60 + size.div_ceil(MIB))
}

/// A local file about to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub declared_type: Option<String>,
    pub data: Bytes,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, declared_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            data: data.into(),
        }
    }

    pub async fn read(path: &Utf8Path, declared_type: Option<String>) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .with_context(|| format!("{path} has no file name"))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read {path}"))?;
        Ok(Self::new(name, declared_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn kind(&self) -> FileKind {
        classify(&self.name, self.declared_type.as_deref())
    }
}

/// Which files are accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allow_all_kinds: bool,
    pub max_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allow_all_kinds: false,
            max_size: MAX_FILE_SIZE,
        }
    }
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            allow_all_kinds: config.allow_all_kinds,
            ..Self::default()
        }
    }

    pub fn check(&self, blob: &FileBlob) -> repodrive::Result<FileKind> {
        let kind = blob.kind();
        if !self.allow_all_kinds && !kind.is_supported() {
            return Err(Error::UnsupportedKind {
                name: blob.name.clone(),
            });
        }
        if blob.size() > self.max_size {
            return Err(Error::TooLarge {
                name: blob.name.clone(),
                size: blob.size(),
                limit: self.max_size,
            });
        }
        Ok(kind)
    }
}

fn placeholder_content(folder_name: &str) -> String {
    format!("# {folder_name}\n\nThis folder was created with repodrive.\n")
}

#[derive(Debug, Clone)]
pub struct Drive<S> {
    storage: S,
    lister: Lister<S>,
    upload: UploadPolicy,
}

impl<S> Drive<S>
where
    S: Storage,
{
    pub fn new(storage: S, listing: ListingPolicy, upload: UploadPolicy) -> Self {
        Self {
            lister: Lister::new(storage.clone(), listing),
            storage,
            upload,
        }
    }

    pub fn from_config(storage: S, config: &Config) -> repodrive::Result<Self> {
        Ok(Self::new(
            storage,
            ListingPolicy::from_config(&config.listing)?,
            UploadPolicy::from_config(&config.upload),
        ))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn lister(&self) -> &Lister<S> {
        &self.lister
    }

    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload
    }

    /// Metadata of whatever lives at `path`
    pub async fn stat(&self, path: &RepoPath) -> repodrive::Result<DirectoryEntry> {
        if path.is_root() {
            return Ok(DirectoryEntry::directory(RepoPath::root()));
        }
        match self.storage.get_contents(path).await? {
            Contents::File(entry) => Ok(entry),
            Contents::Directory(_) => Ok(DirectoryEntry::directory(path.clone())),
        }
    }

    /// The current remote ref of the file at `path`, `None` if nothing is there.
    pub async fn current_ref(&self, path: &RepoPath) -> repodrive::Result<Option<ShaBuf>> {
        match self.storage.get_contents(path).await {
            Ok(Contents::File(entry)) => Ok(entry.remote_ref().map(Sha::to_sha_buf)),
            Ok(Contents::Directory(_)) => Err(Error::Conflict {
                path: path.clone(),
                message: "a folder exists at this path".into(),
            }),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Creates `name` under `parent` by writing its placeholder file.
    pub async fn create_folder(
        &self,
        parent: &RepoPath,
        name: &str,
    ) -> repodrive::Result<PendingMutation> {
        let name = name.trim();
        validate_name(name)?;

        let folder = parent.join(name);
        let placeholder = folder.join(FOLDER_PLACEHOLDER);
        let content = Bytes::from(placeholder_content(name));
        log::info!("Creating folder {folder}");

        self.storage
            .put_file(PutRequest {
                path: &placeholder,
                timeout: upload_timeout(content.len() as u64),
                content,
                message: format!("Create folder {name}"),
                remote_ref: None,
            })
            .await?;
        Ok(PendingMutation::new(folder, MutationKind::Folder))
    }

    /// Uploads `blob` under `parent`, replacing any file of the same name.
    pub async fn upload_file(
        &self,
        parent: &RepoPath,
        blob: FileBlob,
    ) -> repodrive::Result<PendingMutation> {
        validate_name(&blob.name)?;
        let kind = self.upload.check(&blob)?;

        let target = parent.join(&blob.name);
        let remote_ref = self.current_ref(&target).await?;
        let timeout = upload_timeout(blob.size());
        log::info!(
            "Uploading {} file {target} ({} bytes{})",
            kind,
            blob.size(),
            if remote_ref.is_some() { ", replacing" } else { "" }
        );

        self.storage
            .put_file(PutRequest {
                path: &target,
                content: blob.data,
                message: format!("Upload {}", blob.name),
                remote_ref: remote_ref.as_deref(),
                timeout,
            })
            .await?;
        Ok(PendingMutation::new(target, MutationKind::File))
    }

    /// Deletes a file, or every file below a folder.
    ///
    /// Folder deletion stops at the first failing file. The report then lists
    /// what was deleted, what failed and what was not attempted.
    pub async fn delete_entry(&self, entry: &DirectoryEntry) -> repodrive::Result<DeleteReport> {
        if entry.is_file() {
            self.delete_single(entry).await?;
            return Ok(DeleteReport {
                succeeded: vec![entry.path().clone()],
                ..Default::default()
            });
        }

        if entry.path().is_root() {
            return Err(Error::InvalidName {
                name: "/".into(),
                reason: "the repository root cannot be deleted".into(),
            });
        }

        let files = self.collect_files(entry.path()).await?;
        log::info!("Deleting folder {} ({} files)", entry.path(), files.len());

        let mut report = DeleteReport::default();
        let mut files = files.into_iter();
        while let Some(file) = files.next() {
            match self.delete_listed(&file).await {
                Ok(()) => report.succeeded.push(file.path().clone()),
                Err(err) => {
                    log::warn!("Deleting {} failed: {err}", file.path());
                    report.failed.push((file.path().clone(), err.to_string()));
                    report
                        .not_attempted
                        .extend(files.by_ref().map(|f| f.path().clone()));
                    break;
                }
            }
        }

        if report.is_complete() {
            Ok(report)
        } else {
            Err(Error::PartialFailure(report))
        }
    }

    /// Deletes a single file after checking its ref against the remote one.
    async fn delete_single(&self, entry: &DirectoryEntry) -> repodrive::Result<()> {
        let path = entry.path();
        let current = self
            .current_ref(path)
            .await?
            .ok_or_else(|| Error::NotFound(path.clone()))?;
        if let Some(listed) = entry.remote_ref() {
            if listed != current.as_sha() {
                return Err(Error::Stale {
                    path: path.clone(),
                    message: format!("listed at {listed}, now at {current}"),
                });
            }
        }
        self.storage
            .delete_file(path, &current, &delete_message(entry))
            .await
    }

    /// Deletes a file with the ref of a fresh listing.
    async fn delete_listed(&self, entry: &DirectoryEntry) -> repodrive::Result<()> {
        match entry.remote_ref() {
            Some(remote_ref) => {
                self.storage
                    .delete_file(entry.path(), remote_ref, &delete_message(entry))
                    .await
            }
            None => self.delete_single(entry).await,
        }
    }

    /// Every file below `dir`, breadth first, each directory in listing order.
    async fn collect_files(&self, dir: &RepoPath) -> repodrive::Result<Vec<DirectoryEntry>> {
        let mut files = Vec::new();
        let mut dirs = vec![dir.clone()];
        let mut idx = 0;
        while idx < dirs.len() {
            for entry in self.lister.list_all(&dirs[idx]).await? {
                if entry.is_dir() {
                    dirs.push(entry.path().clone());
                } else {
                    files.push(entry);
                }
            }
            idx += 1;
        }
        Ok(files)
    }
}

fn delete_message(entry: &DirectoryEntry) -> String {
    format!("Delete file: {}", entry.name())
}
