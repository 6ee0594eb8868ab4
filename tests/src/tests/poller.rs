use std::time::Duration;

use repodrive::path::RepoPath;
use repodrived::{
    poller::{poll_until_visible, PollState, MAX_ATTEMPTS},
    FileBlob, MutationKind, PendingMutation, PollOutcome, Poller,
};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn visible_right_away() {
    let harness = crate::harness();
    let pending = harness
        .drive
        .create_folder(&RepoPath::root(), "drafts")
        .await
        .unwrap();

    let start = Instant::now();
    let outcome = poll_until_visible(harness.drive.lister(), pending).await;
    assert!(matches!(&outcome, PollOutcome::Resolved(m) if m.attempt() == 0));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(harness.store.listings_of(""), 1);
}

#[tokio::test(start_paused = true)]
async fn visible_after_lag() {
    let harness = crate::harness();
    harness.store.set_lag(3);
    let blob = FileBlob::new("late.md", None, &b"# Late"[..]);
    let pending = harness
        .drive
        .upload_file(&RepoPath::new("docs"), blob)
        .await
        .unwrap();

    let start = Instant::now();
    let outcome = poll_until_visible(harness.drive.lister(), pending).await;
    let PollOutcome::Resolved(mutation) = outcome else {
        panic!("expected the file to show up");
    };
    assert_eq!(mutation.attempt(), 3);
    assert_eq!(harness.store.listings_of("docs"), 4);
    // 1s + 1.5s + 2.25s
    assert_eq!(start.elapsed(), Duration::from_millis(4750));
}

#[tokio::test(start_paused = true)]
async fn file_gives_up_after_max_attempts() {
    let harness = crate::harness();
    harness.store.set_lag(100);
    let blob = FileBlob::new("never.md", None, &b"# Never"[..]);
    let pending = harness
        .drive
        .upload_file(&RepoPath::root(), blob)
        .await
        .unwrap();

    let start = Instant::now();
    let outcome = poll_until_visible(harness.drive.lister(), pending).await;
    let PollOutcome::GaveUp(mutation) = outcome else {
        panic!("expected to give up");
    };
    assert_eq!(mutation.attempt(), MAX_ATTEMPTS);
    assert_eq!(harness.store.listings_of(""), MAX_ATTEMPTS as usize);
    // 1 + 1.5 + 2.25 + 3.375 + 5 * 5, capped at 5s
    assert_eq!(start.elapsed(), Duration::from_millis(33_125));
}

#[tokio::test(start_paused = true)]
async fn folder_backoff_caps_at_ten_seconds() {
    let harness = crate::harness();
    harness.store.set_lag(100);
    let pending = harness
        .drive
        .create_folder(&RepoPath::root(), "slow")
        .await
        .unwrap();

    let start = Instant::now();
    let outcome = poll_until_visible(harness.drive.lister(), pending).await;
    assert!(matches!(outcome, PollOutcome::GaveUp(_)));
    let expected: Duration = (0..MAX_ATTEMPTS - 1)
        .map(|a| MutationKind::Folder.backoff().delay(a))
        .sum();
    // the timer works at millisecond resolution
    let elapsed = start.elapsed();
    assert!(elapsed >= expected && elapsed < expected + Duration::from_millis(10));
    assert!(expected > Duration::from_secs(50));
}

#[tokio::test(start_paused = true)]
async fn tracks_mutations_independently() {
    let harness = crate::harness();
    harness.store.set_lag(2);
    let first = harness
        .drive
        .create_folder(&RepoPath::root(), "one")
        .await
        .unwrap();
    let second = harness
        .drive
        .create_folder(&RepoPath::new("docs"), "two")
        .await
        .unwrap();

    let one = RepoPath::new("one");
    let (poller, mut events) = Poller::new(harness.drive.lister().clone());
    assert_eq!(poller.state(&one), PollState::Idle);
    poller.track(first, 7);
    poller.track(second, 7);
    assert_eq!(poller.pending_count(), 2);
    assert_eq!(poller.state(&one), PollState::Polling);

    let mut resolved = Vec::new();
    for _ in 0..2 {
        let event = events.recv().await.unwrap();
        assert_eq!(event.epoch, 7);
        assert_eq!(event.outcome.state(), PollState::Resolved);
        resolved.push(event.outcome.mutation().target().as_str().to_string());
    }
    resolved.sort();
    assert_eq!(resolved, ["docs/two", "one"]);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(poller.state(&one), PollState::Idle);
}

#[tokio::test(start_paused = true)]
async fn tracking_again_replaces() {
    let harness = crate::harness();
    harness.store.set_lag(2);
    let pending = harness
        .drive
        .create_folder(&RepoPath::root(), "again")
        .await
        .unwrap();

    let (poller, mut events) = Poller::new(harness.drive.lister().clone());
    poller.track(pending.clone(), 1);
    poller.track(pending, 2);
    assert_eq!(poller.pending_count(), 1);

    let event = events.recv().await.unwrap();
    assert_eq!(event.epoch, 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!poller.has_pending());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn cancel_all_stops_polling() {
    let harness = crate::harness();
    harness.store.set_lag(100);
    let pending = harness
        .drive
        .create_folder(&RepoPath::root(), "cancelled")
        .await
        .unwrap();

    let (poller, mut events) = Poller::new(harness.drive.lister().clone());
    poller.track(pending, 0);
    assert!(poller.is_tracking(&RepoPath::new("cancelled")));

    tokio::time::sleep(Duration::from_secs(3)).await;
    poller.cancel_all();
    assert!(!poller.has_pending());
    let listings = harness.store.listings_of("");

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.store.listings_of(""), listings);
    assert!(events.try_recv().is_err());
}
