use repodrive::{path::RepoPath, FileKind};
use repodrived::{FileBlob, MutationKind, NoticeLevel, PendingMutation, PollEvent, PollOutcome};

use crate::harness::names;

#[tokio::test]
async fn navigation_and_history() {
    let harness = crate::harness();
    let mut browser = harness.browser("").await;
    assert_eq!(browser.location(), "/drive");
    assert_eq!(names(browser.entries())[..2], ["Photos", "docs"]);

    browser.navigate_to(RepoPath::new("docs/img")).await;
    assert_eq!(browser.location(), "/drive/docs/img");
    assert_eq!(names(browser.entries()), ["diagram.svg"]);
    let crumbs: Vec<_> = browser
        .navigation()
        .breadcrumbs()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(crumbs, ["Home", "docs", "img"]);

    browser.navigate_up().await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs"));
    assert_eq!(names(browser.entries()), ["img", "guide.md"]);

    browser.back().await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs/img"));

    // revisiting truncates the history
    browser.navigate_to(RepoPath::root()).await;
    assert_eq!(browser.navigation().history(), [RepoPath::root()]);
    browser.unmount();
}

#[tokio::test]
async fn file_like_paths_go_home() {
    let harness = crate::harness();
    let mut browser = harness.browser("docs/guide.md").await;
    assert!(browser.current_path().is_root());

    browser.navigate_to(RepoPath::new("docs")).await;
    browser.navigate_to(RepoPath::new("docs/guide.md")).await;
    assert!(browser.current_path().is_root());
}

#[tokio::test]
async fn open_file_and_directory() {
    let harness = crate::harness();
    let mut browser = harness.browser("docs").await;

    let guide = browser.entries()[1].clone();
    let preview = browser.open(&guide).await.unwrap();
    assert_eq!(preview.kind, FileKind::Markdown);
    assert_eq!(
        preview.raw_url.unwrap().as_str(),
        "https://raw.githubusercontent.com/o/r/main/docs/guide.md"
    );
    assert_eq!(
        preview.proxy_path.unwrap(),
        "/proxy?url=https%3A%2F%2Fraw.githubusercontent.com%2Fo%2Fr%2Fmain%2Fdocs%2Fguide.md"
    );
    assert_eq!(browser.current_path(), &RepoPath::new("docs"));

    let img = browser.entries()[0].clone();
    assert!(browser.open(&img).await.is_none());
    assert_eq!(browser.current_path(), &RepoPath::new("docs/img"));
}

#[tokio::test(start_paused = true)]
async fn created_folder_is_entered_once_visible() {
    let harness = crate::harness();
    harness.store.set_lag(2);
    let mut browser = harness.browser("docs").await;

    assert!(browser.create_folder("drafts").await);
    assert_eq!(browser.pending_count(), 1);
    assert_eq!(browser.notices()[0].level, NoticeLevel::Success);

    browser.settle().await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs/drafts"));
    assert!(browser.entries().is_empty());
    assert_eq!(browser.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_folder_gets_a_note() {
    let harness = crate::harness();
    harness.store.set_lag(100);
    let mut browser = harness.browser("").await;

    assert!(browser.create_folder("slow").await);
    browser.settle().await;

    assert!(browser.current_path().is_root());
    let notices = browser.take_notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[1].level, NoticeLevel::Info);
    assert!(notices[1].message.contains("may take a moment to appear"));
}

#[tokio::test(start_paused = true)]
async fn uploaded_file_shows_up() {
    let harness = crate::harness();
    harness.store.set_lag(1);
    let mut browser = harness.browser("Photos").await;

    let blob = FileBlob::new("d.jpg", Some("image/jpeg".into()), &b"d"[..]);
    assert!(browser.upload(blob).await);
    assert_eq!(names(browser.entries()), ["a.jpg", "b.jpg", "c.jpg"]);

    browser.settle().await;
    assert_eq!(names(browser.entries()), ["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
    assert_eq!(browser.current_path(), &RepoPath::new("Photos"));
}

#[tokio::test(start_paused = true)]
async fn navigating_away_cancels_polls() {
    let harness = crate::harness();
    harness.store.set_lag(3);
    let mut browser = harness.browser("").await;

    assert!(browser.create_folder("pending").await);
    browser.navigate_to(RepoPath::new("docs")).await;
    assert_eq!(browser.pending_count(), 0);

    browser.settle().await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs"));
}

#[tokio::test]
async fn events_of_previous_epochs_are_ignored() {
    let harness = crate::harness();
    let mut browser = harness.browser("").await;
    let old_epoch = browser.epoch();

    browser.navigate_to(RepoPath::new("Photos")).await;
    assert_ne!(browser.epoch(), old_epoch);

    let mutation = PendingMutation::new(RepoPath::new("docs"), MutationKind::Folder);
    browser
        .handle_poll_event(PollEvent {
            epoch: old_epoch,
            outcome: PollOutcome::Resolved(mutation.clone()),
        })
        .await;
    assert_eq!(browser.current_path(), &RepoPath::new("Photos"));

    let epoch = browser.epoch();
    browser
        .handle_poll_event(PollEvent {
            epoch,
            outcome: PollOutcome::Resolved(mutation),
        })
        .await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs"));
}

#[tokio::test]
async fn failures_become_notices() {
    let harness = crate::harness();
    let mut browser = harness.browser("").await;

    assert!(!browser.create_folder("bad|name").await);
    assert!(!browser
        .upload(FileBlob::new("setup.exe", None, &b"MZ"[..]))
        .await);
    let titles: Vec<_> = browser.take_notices().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["Invalid name", "Invalid file type"]);
    assert_eq!(browser.pending_count(), 0);
    assert_eq!(harness.store.puts(), 0);
}

#[tokio::test]
async fn partial_delete_refreshes_listing() {
    let harness = crate::harness();
    harness.store.fail_delete_of("Photos/b.jpg");
    let mut browser = harness.browser("").await;

    let photos = browser.entries()[0].clone();
    assert!(!browser.delete(&photos).await);

    let notices = browser.take_notices();
    assert_eq!(notices[0].title, "Partially deleted");
    assert_eq!(names(browser.entries())[0], "Photos");

    browser.navigate_to(RepoPath::new("Photos")).await;
    assert_eq!(names(browser.entries()), ["b.jpg", "c.jpg"]);
}

#[tokio::test]
async fn unavailable_remote_empties_listing() {
    let harness = crate::harness();
    let mut browser = harness.browser("docs").await;
    assert!(!browser.entries().is_empty());

    harness.store.set_unavailable(Some(502));
    browser.refresh().await;
    assert!(browser.entries().is_empty());
    assert_eq!(browser.notices()[0].title, "Remote unavailable");
}

#[tokio::test(start_paused = true)]
async fn timed_out_folder_is_still_awaited() {
    let harness = crate::harness();
    harness.store.set_puts_time_out(true);
    harness.store.set_lag(1);
    let mut browser = harness.browser("docs").await;

    assert!(!browser.create_folder("drafts").await);
    assert_eq!(browser.pending_count(), 1);
    let notices = browser.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "Timed out");

    browser.settle().await;
    assert_eq!(browser.current_path(), &RepoPath::new("docs/drafts"));
    assert_eq!(browser.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn timed_out_upload_is_still_awaited() {
    let harness = crate::harness();
    harness.store.set_puts_time_out(true);
    harness.store.set_lag(1);
    let mut browser = harness.browser("Photos").await;

    let blob = FileBlob::new("d.jpg", Some("image/jpeg".into()), &b"d"[..]);
    assert!(!browser.upload(blob).await);
    assert_eq!(browser.pending_count(), 1);
    assert_eq!(browser.notices()[0].title, "Timed out");

    browser.settle().await;
    assert_eq!(names(browser.entries()), ["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
}

#[tokio::test(start_paused = true)]
async fn writes_land_under_requested_parent() {
    let harness = crate::harness();
    harness.store.insert("course.v2/README.md", "# Course");
    let mut browser = harness.browser("course.v2").await;
    assert!(browser.current_path().is_root());

    let parent = RepoPath::new("course.v2");
    assert!(browser.create_folder_in(&parent, "x").await);
    let blob = FileBlob::new("a.md", None, &b"# A"[..]);
    assert!(browser.upload_to(&parent, blob).await);
    browser.settle().await;

    assert!(harness.store.file("course.v2/x/README.md").is_some());
    assert!(harness.store.file("course.v2/a.md").is_some());
    assert!(harness.store.file("x/README.md").is_none());
    assert!(harness.store.file("a.md").is_none());
    assert_eq!(browser.pending_count(), 0);
}
