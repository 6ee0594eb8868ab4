//! Interactive browsing session over a drive.
//!
//! The browser owns the navigation state, the current listing and the polls
//! of pending mutations. Poll events carry the epoch in which they were
//! started; navigating bumps the epoch so late events of a previous location
//! are ignored.

use std::fmt;

use repodrive::{
    nav::NavigationState,
    path::RepoPath,
    raw_url::{proxy_path, resolve_raw_content_url},
    DirectoryEntry, Error, FileKind,
};
use serde::Serialize;
use tokio::sync::mpsc;
use url::Url;

use crate::{
    drive::{Drive, FileBlob},
    poller::{MutationKind, PendingMutation, PollEvent, PollOutcome, Poller},
    storage::Storage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// User facing message about the outcome of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        let title = match err {
            Error::NotFound(..) => "Not found",
            Error::RemoteUnavailable { .. } => "Remote unavailable",
            Error::InvalidName { .. } => "Invalid name",
            Error::UnsupportedKind { .. } => "Invalid file type",
            Error::TooLarge { .. } => "File too large",
            Error::Conflict { .. } => "Conflict",
            Error::Stale { .. } => "Changed remotely",
            Error::Timeout { .. } => "Timed out",
            Error::PartialFailure(..) => "Partially deleted",
            _ => "Error",
        };
        Notice::error(title, err.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// What to show when a file is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub name: String,
    pub kind: FileKind,
    pub raw_url: Option<Url>,
    /// Same-origin path fetching `raw_url` through the proxy
    pub proxy_path: Option<String>,
}

pub struct Browser<S> {
    drive: Drive<S>,
    nav: NavigationState,
    entries: Vec<DirectoryEntry>,
    notices: Vec<Notice>,
    poller: Poller<S>,
    events: mpsc::UnboundedReceiver<PollEvent>,
    epoch: u64,
}

impl<S> Browser<S>
where
    S: Storage,
{
    /// Opens a session at `initial` and loads its listing.
    pub async fn mount(drive: Drive<S>, initial: RepoPath, route_prefix: &str) -> Self {
        let (poller, events) = Poller::new(drive.lister().clone());
        let mut browser = Self {
            nav: NavigationState::new(initial, route_prefix),
            drive,
            entries: Vec::new(),
            notices: Vec::new(),
            poller,
            events,
            epoch: 0,
        };
        log::debug!("mounted at {}", browser.nav.current());
        browser.refresh().await;
        browser
    }

    pub fn current_path(&self) -> &RepoPath {
        self.nav.current()
    }

    pub fn location(&self) -> String {
        self.nav.location()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending_count(&self) -> usize {
        self.poller.pending_count()
    }

    /// Reloads the listing of the current path.
    /// On failure the listing is emptied and an error notice is raised.
    pub async fn refresh(&mut self) {
        let path = self.nav.current().clone();
        match self.drive.lister().list(&path).await {
            Ok(entries) => self.entries = entries,
            Err(err) => {
                log::error!("Listing {path} failed: {err}");
                self.entries.clear();
                self.notify_error(&err);
            }
        }
    }

    pub async fn navigate_to(&mut self, path: RepoPath) {
        if self.nav.navigate_to(path) {
            self.left_location();
            self.refresh().await;
        }
    }

    pub async fn navigate_up(&mut self) {
        if self.nav.up() {
            self.left_location();
            self.refresh().await;
        }
    }

    pub async fn back(&mut self) {
        if self.nav.back() {
            self.left_location();
            self.refresh().await;
        }
    }

    /// Navigates into directories, returns the preview of files.
    pub async fn open(&mut self, entry: &DirectoryEntry) -> Option<Preview> {
        if entry.is_dir() {
            self.navigate_to(entry.path().clone()).await;
            return None;
        }
        let raw_url = entry.view_url().and_then(|view_url| {
            resolve_raw_content_url(view_url)
                .map_err(|err| log::warn!("No raw content for {}: {err}", entry.path()))
                .ok()
        });
        Some(Preview {
            name: entry.name().to_string(),
            kind: entry.file_kind().unwrap_or(FileKind::Generic),
            proxy_path: raw_url.as_ref().map(proxy_path),
            raw_url,
        })
    }

    /// Creates a folder in the current directory and starts waiting for it.
    pub async fn create_folder(&mut self, name: &str) -> bool {
        let parent = self.nav.current().clone();
        self.create_folder_in(&parent, name).await
    }

    /// Creates a folder under `parent`, which needs not be the current
    /// directory. A timed out write is polled for as well.
    pub async fn create_folder_in(&mut self, parent: &RepoPath, name: &str) -> bool {
        match self.drive.create_folder(parent, name).await {
            Ok(mutation) => {
                self.notices.push(Notice::success(
                    "Success",
                    format!("Folder '{}' created successfully", mutation.name()),
                ));
                self.poller.track(mutation, self.epoch);
                true
            }
            Err(err) => {
                self.notify_error(&err);
                if err.maybe_applied() {
                    let target = parent.join(name.trim());
                    self.poller
                        .track(PendingMutation::new(target, MutationKind::Folder), self.epoch);
                }
                false
            }
        }
    }

    /// Uploads into the current directory and starts waiting for the file.
    pub async fn upload(&mut self, blob: FileBlob) -> bool {
        let parent = self.nav.current().clone();
        self.upload_to(&parent, blob).await
    }

    /// Uploads under `parent`, which needs not be the current directory.
    pub async fn upload_to(&mut self, parent: &RepoPath, blob: FileBlob) -> bool {
        let target = parent.join(&blob.name);
        match self.drive.upload_file(parent, blob).await {
            Ok(mutation) => {
                self.notices.push(Notice::success(
                    "Success",
                    format!("File '{}' uploaded successfully", mutation.name()),
                ));
                self.refresh().await;
                self.poller.track(mutation, self.epoch);
                true
            }
            Err(err) => {
                self.notify_error(&err);
                if err.maybe_applied() {
                    self.poller
                        .track(PendingMutation::new(target, MutationKind::File), self.epoch);
                }
                false
            }
        }
    }

    pub async fn delete(&mut self, entry: &DirectoryEntry) -> bool {
        let done = match self.drive.delete_entry(entry).await {
            Ok(report) => {
                let what = if entry.is_dir() { "Folder" } else { "File" };
                log::info!("{} deleted ({} files)", entry.path(), report.succeeded.len());
                self.notices.push(Notice::success(
                    "Success",
                    format!("{what} '{}' deleted successfully", entry.name()),
                ));
                true
            }
            Err(err) => {
                self.notify_error(&err);
                false
            }
        };
        self.refresh().await;
        done
    }

    /// Applies the outcome of a poll. Events of a previous epoch are ignored.
    pub async fn handle_poll_event(&mut self, event: PollEvent) {
        if event.epoch != self.epoch {
            log::debug!(
                "ignoring poll event of epoch {} (now {})",
                event.epoch,
                self.epoch
            );
            return;
        }
        match event.outcome {
            PollOutcome::Resolved(mutation) => match mutation.kind() {
                MutationKind::Folder => self.navigate_to(mutation.target().clone()).await,
                MutationKind::File => self.refresh().await,
            },
            PollOutcome::GaveUp(mutation) => {
                let what = match mutation.kind() {
                    MutationKind::Folder => "Folder",
                    MutationKind::File => "File",
                };
                self.notices.push(Notice::info(
                    "Note",
                    format!(
                        "{what} '{}' was saved. It may take a moment to appear.",
                        mutation.name()
                    ),
                ));
                self.refresh().await;
            }
        }
    }

    /// Next poll event, waiting for it only while polls are pending.
    pub async fn next_poll_event(&mut self) -> Option<PollEvent> {
        // tasks send before untracking, so checking first cannot miss an event
        let pending = self.poller.has_pending();
        if let Ok(event) = self.events.try_recv() {
            return Some(event);
        }
        if !pending {
            return None;
        }
        self.events.recv().await
    }

    /// Handles poll events until no poll is pending.
    pub async fn settle(&mut self) {
        while let Some(event) = self.next_poll_event().await {
            self.handle_poll_event(event).await;
        }
    }

    /// Ends the session, cancelling every pending poll.
    pub fn unmount(self) {
        log::debug!("unmounting at {}", self.nav.current());
        self.poller.cancel_all();
    }

    fn left_location(&mut self) {
        self.epoch += 1;
        self.poller.cancel_all();
    }

    fn notify_error(&mut self, err: &Error) {
        self.notices.push(Notice::from(err));
    }
}
