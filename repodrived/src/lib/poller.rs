//! Confirmation that a successful write became visible in listings.
//!
//! The remote acknowledges writes before they show up in directory listings.
//! Each accepted mutation is tracked by its target path and its parent directory
//! is re-listed with exponential backoff until the target appears or the
//! attempts are exhausted.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use dashmap::DashMap;
use futures::future::{AbortHandle, Abortable};
use repodrive::{path::RepoPath, EntryKind};
use tokio::sync::mpsc;

use crate::{lister::Lister, storage::GetContents};

/// Number of listings made before giving up
pub const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Folder,
    File,
}

impl MutationKind {
    pub fn backoff(self) -> Backoff {
        let cap = match self {
            MutationKind::Folder => Duration::from_secs(10),
            MutationKind::File => Duration::from_secs(5),
        };
        Backoff {
            base: Duration::from_secs(1),
            cap,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    fn entry_kind(self) -> EntryKind {
        match self {
            MutationKind::Folder => EntryKind::Directory,
            MutationKind::File => EntryKind::File,
        }
    }
}

/// A write accepted by the remote but possibly not yet visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    target: RepoPath,
    kind: MutationKind,
    attempt: u32,
}

impl PendingMutation {
    pub fn new(target: RepoPath, kind: MutationKind) -> Self {
        Self {
            target,
            kind,
            attempt: 0,
        }
    }

    pub fn target(&self) -> &RepoPath {
        &self.target
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Number of listings that did not show the target
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn name(&self) -> &str {
        self.target.file_name().unwrap_or_default()
    }

    pub fn parent(&self) -> RepoPath {
        self.target.parent().unwrap_or_else(RepoPath::root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Backoff {
    /// Delay following the listing number `attempt` (0-based):
    /// `min(base * 1.5^attempt, cap)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.base.as_secs_f64() * 1.5f64.powi(attempt.min(i32::MAX as u32) as i32);
        if !secs.is_finite() || secs >= self.cap.as_secs_f64() {
            self.cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Resolved,
    GaveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Resolved(PendingMutation),
    GaveUp(PendingMutation),
}

impl PollOutcome {
    pub fn mutation(&self) -> &PendingMutation {
        match self {
            PollOutcome::Resolved(m) | PollOutcome::GaveUp(m) => m,
        }
    }

    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Resolved(_) => PollState::Resolved,
            PollOutcome::GaveUp(_) => PollState::GaveUp,
        }
    }
}

/// Lists the parent of the mutation target until an entry of the expected kind
/// and name shows up. Listing failures count as "not visible yet".
pub async fn poll_until_visible<S>(lister: &Lister<S>, mut mutation: PendingMutation) -> PollOutcome
where
    S: GetContents + Send + Sync,
{
    let backoff = mutation.kind.backoff();
    let parent = mutation.parent();
    let expected = mutation.kind.entry_kind();

    loop {
        match lister.list_all(&parent).await {
            Ok(entries)
                if entries
                    .iter()
                    .any(|e| e.kind() == expected && e.name() == mutation.name()) =>
            {
                log::info!(
                    "{} visible after {} listing(s)",
                    mutation.target,
                    mutation.attempt + 1
                );
                return PollOutcome::Resolved(mutation);
            }
            Ok(_) => log::debug!("{} not visible yet", mutation.target),
            Err(err) => log::warn!("Listing {parent} failed while polling: {err}"),
        }

        let delay = backoff.delay(mutation.attempt);
        mutation.attempt += 1;
        if mutation.attempt >= backoff.max_attempts {
            log::info!(
                "{} still not visible after {} listings, giving up",
                mutation.target,
                mutation.attempt
            );
            return PollOutcome::GaveUp(mutation);
        }
        log::trace!("next listing of {parent} in {delay:?}");
        tokio::time::sleep(delay).await;
    }
}

/// Sent when a tracked mutation reaches a terminal state.
/// `epoch` is the one given to [Poller::track].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEvent {
    pub epoch: u64,
    pub outcome: PollOutcome,
}

#[derive(Debug)]
struct Tracked {
    id: u64,
    abort: AbortHandle,
}

/// Runs one polling task per tracked target path.
/// Tracking a path again replaces its previous task.
/// Dropping the poller cancels every task.
pub struct Poller<S> {
    lister: Lister<S>,
    tracked: Arc<DashMap<RepoPath, Tracked>>,
    next_id: AtomicU64,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl<S> Poller<S>
where
    S: GetContents + Clone + Send + Sync + 'static,
{
    pub fn new(lister: Lister<S>) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let poller = Self {
            lister,
            tracked: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            events,
        };
        (poller, rx)
    }

    pub fn track(&self, mutation: PendingMutation, epoch: u64) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let target = mutation.target().clone();
        let (abort, registration) = AbortHandle::new_pair();

        if let Some(previous) = self.tracked.insert(target.clone(), Tracked { id, abort }) {
            log::debug!("{target} tracked again, replacing previous poll");
            previous.abort.abort();
        }

        let lister = self.lister.clone();
        let tracked = self.tracked.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let poll = Abortable::new(poll_until_visible(&lister, mutation), registration);
            match poll.await {
                Ok(outcome) => {
                    // receiver gone means nobody waits for it anymore
                    let _ = events.send(PollEvent { epoch, outcome });
                }
                Err(_) => log::trace!("poll of {target} cancelled"),
            }
            tracked.remove_if(&target, |_, t| t.id == id);
        });
    }

    pub fn is_tracking(&self, target: &RepoPath) -> bool {
        self.tracked.contains_key(target)
    }

    /// `Polling` while a task runs for `target`, `Idle` otherwise.
    /// Terminal states are carried by the [PollOutcome] of the task.
    pub fn state(&self, target: &RepoPath) -> PollState {
        if self.is_tracking(target) {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    pub fn pending_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.tracked.is_empty()
    }

    pub fn cancel_all(&self) {
        self.tracked.retain(|target, t| {
            log::debug!("cancelling poll of {target}");
            t.abort.abort();
            false
        });
    }
}

impl<S> Drop for Poller<S> {
    fn drop(&mut self) {
        self.tracked.retain(|_, t| {
            t.abort.abort();
            false
        });
    }
}
