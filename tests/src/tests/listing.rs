use repodrive::{
    config::ListingConfig, listing::ListingPolicy, path::RepoPath, EntryKind, Error, FileKind,
};
use repodrived::Lister;

use crate::harness::names;

#[tokio::test]
async fn root_sorted_dirs_first_readme_hidden() {
    let harness = crate::harness();

    let entries = harness.list("").await;
    assert_eq!(
        names(&entries),
        ["Photos", "docs", "archive.zip", "notes.md", "photo.png", "report.pdf"]
    );
    assert!(entries[..2].iter().all(|e| e.kind() == EntryKind::Directory));
}

#[tokio::test]
async fn list_all_keeps_readme() {
    let harness = crate::harness();

    let entries = harness
        .drive
        .lister()
        .list_all(&RepoPath::new("docs"))
        .await
        .unwrap();
    assert_eq!(names(&entries), ["img", "README.md", "guide.md"]);
}

#[tokio::test]
async fn entries_carry_kind_and_ref() {
    let harness = crate::harness();

    let entries = harness.list("").await;
    let kinds: Vec<_> = entries.iter().map(|e| e.file_kind()).collect();
    assert_eq!(
        kinds,
        [
            None,
            None,
            Some(FileKind::Generic),
            Some(FileKind::Markdown),
            Some(FileKind::Image),
            Some(FileKind::Pdf),
        ]
    );
    let notes = &entries[3];
    assert_eq!(notes.size(), Some(7));
    assert!(notes.remote_ref().is_some());
    assert_eq!(
        notes.view_url(),
        Some("https://github.com/o/r/blob/main/notes.md")
    );
}

#[tokio::test]
async fn missing_directory_is_empty() {
    let harness = crate::harness();

    assert!(harness.list("nowhere/at/all").await.is_empty());
}

#[tokio::test]
async fn file_path_is_empty() {
    let harness = crate::harness();

    assert!(harness.list("docs/guide.md").await.is_empty());
}

#[tokio::test]
async fn unavailable_remote_is_an_error() {
    let harness = crate::harness();
    harness.store.set_unavailable(Some(503));

    let err = harness
        .drive
        .lister()
        .list(&RepoPath::root())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RemoteUnavailable { status: 503, .. }));
}

#[tokio::test]
async fn configured_hide_patterns() {
    let harness = crate::harness();
    let config = ListingConfig {
        hide_readme: false,
        hide: vec!["*.ZIP".into(), "photo*".into()],
    };
    let lister = Lister::new(
        harness.store.clone(),
        ListingPolicy::from_config(&config).unwrap(),
    );

    let entries = lister.list(&RepoPath::root()).await.unwrap();
    assert_eq!(
        names(&entries),
        ["docs", "README.md", "notes.md", "report.pdf"]
    );
}

#[tokio::test]
async fn listing_twice_is_stable() {
    let harness = crate::harness();

    let first = harness.list("docs").await;
    let second = harness.list("docs").await;
    assert_eq!(first, second);
}
