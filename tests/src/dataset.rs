use repodrive::path::RepoPath;

use crate::stubs::memory::MemoryStore;

#[derive(Debug, Copy, Clone)]
pub enum Entry {
    Dir {
        /// Name of the directory
        name: &'static str,
        /// Entries of the directory
        entries: &'static [Entry],
    },
    File {
        /// Name of the file
        name: &'static str,
        /// Content of the file
        content: &'static str,
    },
}

#[rustfmt::skip]
pub const REPO: &[Entry] = &[
    Entry::File{name: "README.md", content: "# Files"},
    Entry::File{name: "notes.md", content: "# Notes"},
    Entry::File{name: "report.pdf", content: "%PDF-1.7"},
    Entry::File{name: "photo.png", content: "PNG"},
    Entry::File{name: "archive.zip", content: "PK"},
    Entry::Dir{name: "docs", entries: &[
        Entry::File{name: "README.md", content: "# Docs"},
        Entry::File{name: "guide.md", content: "# Guide"},
        Entry::Dir{name: "img", entries: &[
            Entry::File{name: "diagram.svg", content: "<svg/>"},
        ]},
    ]},
    Entry::Dir{name: "Photos", entries: &[
        Entry::File{name: "a.jpg", content: "a"},
        Entry::File{name: "b.jpg", content: "b"},
        Entry::File{name: "c.jpg", content: "c"},
    ]},
];

pub fn populate(store: &MemoryStore, entries: &[Entry]) {
    populate_in(store, &RepoPath::root(), entries);
}

fn populate_in(store: &MemoryStore, parent: &RepoPath, entries: &[Entry]) {
    for entry in entries {
        match *entry {
            Entry::Dir { name, entries } => populate_in(store, &parent.join(name), entries),
            Entry::File { name, content } => store.insert(parent.join(name).as_str(), content),
        }
    }
}
