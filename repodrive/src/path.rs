//! Slash separated paths relative to the repository root.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized path inside the repository.
///
/// Separators are always `/`, there is no leading or trailing separator and no
/// empty component. The empty path denotes the repository root.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RepoPath {
    inner: String,
}

impl RepoPath {
    pub fn new<S: AsRef<str> + ?Sized>(path: &S) -> RepoPath {
        let inner = path
            .as_ref()
            .split(|c| c == '/' || c == '\\')
            .filter(|comp| !comp.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        RepoPath { inner }
    }

    pub fn root() -> RepoPath {
        RepoPath::default()
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_string(self) -> String {
        self.inner
    }

    pub fn join<S: AsRef<str> + ?Sized>(&self, rel: &S) -> RepoPath {
        let rel = RepoPath::new(rel);
        if self.is_root() {
            rel
        } else if rel.is_root() {
            self.clone()
        } else {
            RepoPath {
                inner: format!("{}/{}", self.inner, rel.inner),
            }
        }
    }

    /// The parent path, `None` for the root.
    pub fn parent(&self) -> Option<RepoPath> {
        if self.is_root() {
            return None;
        }
        match self.inner.rsplit_once('/') {
            Some((parent, _)) => Some(RepoPath {
                inner: parent.to_string(),
            }),
            None => Some(RepoPath::root()),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(
            self.inner
                .rsplit_once('/')
                .map(|(_, name)| name)
                .unwrap_or(&self.inner),
        )
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|comp| !comp.is_empty())
    }

    /// Every non-root prefix of this path, outermost first.
    ///
    /// `a/b/c` yields `a`, `a/b` and `a/b/c`.
    pub fn ancestors(&self) -> Vec<RepoPath> {
        let mut res = Vec::new();
        let mut cur = RepoPath::root();
        for comp in self.components() {
            cur = cur.join(comp);
            res.push(cur.clone());
        }
        res
    }

    pub fn starts_with(&self, base: &RepoPath) -> bool {
        base.is_root()
            || self.inner == base.inner
            || (self.inner.starts_with(&base.inner)
                && self.inner.as_bytes().get(base.inner.len()) == Some(&b'/'))
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for RepoPath {
    fn from(value: String) -> Self {
        RepoPath::new(&value)
    }
}

impl From<&str> for RepoPath {
    fn from(value: &str) -> Self {
        RepoPath::new(value)
    }
}

impl From<RepoPath> for String {
    fn from(value: RepoPath) -> Self {
        value.inner
    }
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RepoPath(")?;
        fmt::Debug::fmt(&self.inner, f)?;
        f.write_str(")")
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.inner)
        }
    }
}
