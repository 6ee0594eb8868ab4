use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use http::StatusCode;
use repodrive::{
    config::{RemoteConfig, Token},
    path::RepoPath,
    sha::Sha,
    DirectoryEntry, Error, Provider,
};
use reqwest::{header, Method, RequestBuilder, Url};

use super::{Contents, DeleteFile, GetContents, PutFile, PutRequest};
use crate::error;

/// Contents API client of a single repository branch
#[derive(Clone)]
pub struct GitHub {
    client: reqwest::Client,
    base_url: Url,
    owner: String,
    repo: String,
    branch: String,
    token: Option<Token>,
}

impl GitHub {
    pub fn new(config: &RemoteConfig, client: reqwest::Client) -> repodrive::Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|err| repodrive::config_error!("invalid API url '{}': {err}", config.api_url))?;
        if base_url.cannot_be_a_base() {
            return Err(repodrive::config_error!(
                "invalid API url '{}': not a base URL",
                config.api_url
            ));
        }
        if config.token.is_none() {
            log::warn!("No access token configured, only public repositories are readable");
        }
        log::info!(
            "Using {} repository {} on branch {}",
            Provider::GitHub,
            config.repo,
            config.branch
        );
        Ok(Self {
            client,
            base_url,
            owner: config.repo.owner.clone(),
            repo: config.repo.name.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn contents_url(&self, path: &RepoPath) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(path.components());
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self
            .client
            .request(method, url)
            .header(header::USER_AGENT, crate::USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => req.bearer_auth(token.secret()),
            None => req,
        }
    }
}

impl GetContents for GitHub {
    async fn get_contents(&self, path: &RepoPath) -> repodrive::Result<Contents> {
        log::trace!("GET contents {path}");
        let res = self
            .request(Method::GET, self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(error::api)?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.clone()));
        }
        if !status.is_success() {
            let message = utils::error_message(res).await;
            return Err(Error::RemoteUnavailable {
                status: status.as_u16(),
                message,
            });
        }

        match res.json::<api::ContentsResponse>().await.map_err(error::api)? {
            api::ContentsResponse::Directory(items) => Ok(Contents::Directory(
                items
                    .into_iter()
                    .filter_map(api::ContentItem::into_entry)
                    .collect(),
            )),
            api::ContentsResponse::File(item) => item
                .into_entry()
                .map(Contents::File)
                .ok_or_else(|| repodrive::api_error!("unsupported entry at {path}")),
        }
    }
}

impl PutFile for GitHub {
    async fn put_file(&self, req: PutRequest<'_>) -> repodrive::Result<DirectoryEntry> {
        let PutRequest {
            path,
            content,
            message,
            remote_ref,
            timeout,
        } = req;
        let size = content.len() as u64;
        log::info!(
            "PUT {path} ({size} bytes, {})",
            if remote_ref.is_some() { "update" } else { "create" }
        );

        let body = api::PutBody {
            message,
            content: BASE64.encode(&content),
            sha: remote_ref.map(|r| r.as_str().to_string()),
            branch: self.branch.clone(),
        };
        let res = self
            .request(Method::PUT, self.contents_url(path))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| error::request(path, timeout.as_secs(), err))?;

        let status = res.status();
        if !status.is_success() {
            let message = utils::error_message(res).await;
            log::warn!("PUT {path} returned {status}: {message}");
            return Err(match status {
                StatusCode::NOT_FOUND => Error::NotFound(path.clone()),
                StatusCode::CONFLICT => Error::Conflict {
                    path: path.clone(),
                    message,
                },
                StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => Error::Conflict {
                    path: path.clone(),
                    message,
                },
                StatusCode::PAYLOAD_TOO_LARGE => Error::TooLarge {
                    name: path.file_name().unwrap_or_default().to_string(),
                    size,
                    limit: repodrive::MAX_FILE_SIZE,
                },
                _ => Error::RemoteUnavailable {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let res: api::PutResponse = res
            .json()
            .await
            .map_err(|err| error::request(path, timeout.as_secs(), err))?;
        res.content
            .into_entry()
            .ok_or_else(|| repodrive::api_error!("unexpected entry written at {path}"))
    }
}

impl DeleteFile for GitHub {
    async fn delete_file(
        &self,
        path: &RepoPath,
        remote_ref: &Sha,
        message: &str,
    ) -> repodrive::Result<()> {
        log::info!("DELETE {path}");
        let body = api::DeleteBody {
            message: message.to_string(),
            sha: remote_ref.as_str().to_string(),
            branch: self.branch.clone(),
        };
        let res = self
            .request(Method::DELETE, self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(error::api)?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let message = utils::error_message(res).await;
        log::warn!("DELETE {path} returned {status}: {message}");
        Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound(path.clone()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Error::Stale {
                path: path.clone(),
                message,
            },
            _ => Error::RemoteUnavailable {
                status: status.as_u16(),
                message,
            },
        })
    }
}

mod api {
    use repodrive::{path::RepoPath, sha::ShaBuf, DirectoryEntry};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EntryType {
        File,
        Dir,
        Symlink,
        Submodule,
        #[serde(other)]
        Other,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ContentItem {
        pub name: String,
        pub path: String,
        pub sha: String,
        #[serde(default)]
        pub size: u64,
        #[serde(rename = "type")]
        pub entry_type: EntryType,
        pub html_url: Option<String>,
    }

    impl ContentItem {
        pub fn into_entry(self) -> Option<DirectoryEntry> {
            let path = RepoPath::new(&self.path);
            let entry = match self.entry_type {
                EntryType::Dir => DirectoryEntry::directory(path),
                EntryType::File => DirectoryEntry::file(path, self.size),
                other => {
                    log::debug!("skipping {:?} entry {}", other, self.name);
                    return None;
                }
            };
            Some(
                entry
                    .with_remote_ref(ShaBuf::from(self.sha))
                    .with_view_url(self.html_url),
            )
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum ContentsResponse {
        Directory(Vec<ContentItem>),
        File(ContentItem),
    }

    #[derive(Debug, Serialize)]
    pub struct PutBody {
        pub message: String,
        pub content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sha: Option<String>,
        pub branch: String,
    }

    #[derive(Debug, Serialize)]
    pub struct DeleteBody {
        pub message: String,
        pub sha: String,
        pub branch: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct PutResponse {
        pub content: ContentItem,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub message: String,
    }
}

mod utils {
    use reqwest::Response;

    use super::api;

    pub async fn error_message(res: Response) -> String {
        let status = res.status();
        match res.json::<api::ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        }
    }
}
