//! Navigation state of a browser view.

use serde::Serialize;

use crate::path::RepoPath;

pub const DEFAULT_ROUTE_PREFIX: &str = "/drive";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    pub path: RepoPath,
}

/// Current directory and visited history.
///
/// History is not an unbounded stack: revisiting a path truncates the history
/// right after its first occurrence.
#[derive(Debug, Clone)]
pub struct NavigationState {
    current: RepoPath,
    history: Vec<RepoPath>,
    route_prefix: String,
}

/// Paths with a `.` look like files and can't be listed.
pub fn is_navigable(path: &RepoPath) -> bool {
    !path.as_str().contains('.')
}

impl NavigationState {
    pub fn new(initial: RepoPath, route_prefix: &str) -> Self {
        let initial = if is_navigable(&initial) {
            initial
        } else {
            RepoPath::root()
        };
        Self {
            history: vec![initial.clone()],
            current: initial,
            route_prefix: route_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn current(&self) -> &RepoPath {
        &self.current
    }

    pub fn history(&self) -> &[RepoPath] {
        &self.history
    }

    /// Moves to `path`, or to the root if `path` is not navigable.
    /// Returns whether the current path changed.
    pub fn navigate_to(&mut self, path: RepoPath) -> bool {
        let path = if is_navigable(&path) {
            path
        } else {
            RepoPath::root()
        };
        if path == self.current {
            return false;
        }
        match self.history.iter().position(|p| *p == path) {
            Some(idx) => self.history.truncate(idx + 1),
            None => self.history.push(path.clone()),
        }
        self.current = path;
        true
    }

    /// Goes back to the previous history entry, if any.
    pub fn back(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        let prev = self.history[self.history.len() - 2].clone();
        self.navigate_to(prev)
    }

    pub fn up(&mut self) -> bool {
        match self.current.parent() {
            Some(parent) => self.navigate_to(parent),
            None => false,
        }
    }

    /// Externally visible location of the current path.
    pub fn location(&self) -> String {
        location_of(&self.route_prefix, &self.current)
    }

    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        let mut crumbs = vec![Crumb {
            name: "Home".to_string(),
            path: RepoPath::root(),
        }];
        for path in self.current.ancestors() {
            crumbs.push(Crumb {
                name: path.file_name().unwrap_or_default().to_string(),
                path,
            });
        }
        crumbs
    }
}

pub fn location_of(route_prefix: &str, path: &RepoPath) -> String {
    let prefix = route_prefix.trim_end_matches('/');
    if path.is_root() {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else {
        let encoded: Vec<_> = path
            .components()
            .map(|comp| urlencoding::encode(comp).into_owned())
            .collect();
        format!("{prefix}/{}", encoded.join("/"))
    }
}

/// Maps a location back to a repository path.
///
/// Locations outside of `route_prefix` map to the root.
pub fn path_from_location(route_prefix: &str, location: &str) -> RepoPath {
    let prefix = route_prefix.trim_end_matches('/');
    let location = location.split(['?', '#']).next().unwrap_or_default();
    let rest = match location.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return RepoPath::root(),
    };
    let decoded: Vec<String> = rest
        .split('/')
        .filter(|comp| !comp.is_empty())
        .map(|comp| {
            urlencoding::decode(comp)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| comp.to_string())
        })
        .collect();
    RepoPath::new(&decoded.join("/"))
}
