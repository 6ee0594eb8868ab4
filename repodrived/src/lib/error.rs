use std::fmt;

use repodrive::path::RepoPath;

pub fn api<E: fmt::Display>(err: E) -> repodrive::Error {
    repodrive::Error::Api(err.to_string())
}

/// Maps a failed request. Client side timeouts are reported distinctly since
/// the write may still be applied remotely.
pub fn request(path: &RepoPath, timeout_secs: u64, err: reqwest::Error) -> repodrive::Error {
    if err.is_timeout() {
        repodrive::Error::Timeout {
            path: path.clone(),
            secs: timeout_secs,
        }
    } else {
        api(err)
    }
}
