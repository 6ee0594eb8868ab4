//! Mapping of browsable URLs to raw content URLs.
//!
//! Rules:
//! - `https://github.com/{owner}/{repo}/blob/{branch}/{path..}` maps to
//!   `https://raw.githubusercontent.com/{owner}/{repo}/{branch}/{path..}`
//! - raw URLs and URLs of any other shape are returned unchanged

use url::Url;

use crate::{Error, Result};

pub const VIEW_HOST: &str = "github.com";
pub const RAW_HOST: &str = "raw.githubusercontent.com";
pub const PROXY_ROUTE: &str = "/proxy";

pub fn resolve_raw_content_url(view_url: &str) -> Result<Url> {
    let url = Url::parse(view_url)
        .map_err(|err| Error::Other(format!("Invalid URL '{view_url}': {err}")))?;

    let is_view_host = matches!(url.host_str(), Some(h) if h.eq_ignore_ascii_case(VIEW_HOST) || h.eq_ignore_ascii_case("www.github.com"));
    if !is_view_host {
        return Ok(url);
    }

    let segments: Vec<&str> = match url.path_segments() {
        Some(segments) => segments.collect(),
        None => return Ok(url),
    };
    match segments.as_slice() {
        [owner, repo, "blob", branch, path @ ..] if !path.is_empty() => {
            let raw = format!(
                "https://{RAW_HOST}/{owner}/{repo}/{branch}/{}",
                path.join("/")
            );
            Url::parse(&raw).map_err(|err| Error::Other(format!("Invalid URL '{raw}': {err}")))
        }
        _ => Ok(url),
    }
}

/// Same-origin proxy path fetching `raw_url`.
pub fn proxy_path(raw_url: &Url) -> String {
    format!("{PROXY_ROUTE}?url={}", urlencoding::encode(raw_url.as_str()))
}
