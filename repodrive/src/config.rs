use std::{fmt, net::SocketAddr, str::FromStr};

use anyhow::Context;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::{nav::DEFAULT_ROUTE_PREFIX, Error};

pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_REPO: &str = "GITHUB_REPO";
pub const ENV_BRANCH: &str = "GITHUB_BRANCH";

/// Repository identifier in the `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSpec {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoSpec {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "expected repository as 'owner/name', got '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for RepoSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoSpec> for String {
    fn from(value: RepoSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Access token of the backing store. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(secret: String) -> Self {
        Token(secret)
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub repo: RepoSpec,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

impl RemoteConfig {
    pub fn new(repo: RepoSpec) -> Self {
        Self {
            repo,
            branch: default_branch(),
            api_url: default_api_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub hide_readme: bool,
    pub hide: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            hide_readme: true,
            hide: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub allow_all_kinds: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub route_prefix: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    /// Hosts the proxy may fetch from. Empty allows any host.
    pub allowed_hosts: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            allowed_hosts: vec![
                crate::raw_url::RAW_HOST.to_string(),
                crate::raw_url::VIEW_HOST.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Config {
    pub fn new(repo: RepoSpec) -> Self {
        Self {
            remote: RemoteConfig::new(repo),
            listing: ListingConfig::default(),
            upload: UploadConfig::default(),
            browser: BrowserConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }

    pub async fn load_from_file(path: &Utf8Path) -> anyhow::Result<Self> {
        let config_json = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read config from {path}"))?;
        let config_json = std::str::from_utf8(&config_json)?;
        serde_json::from_str(config_json).with_context(|| format!("Invalid config in {path}"))
    }

    /// Builds a configuration from the environment alone.
    pub fn from_env() -> anyhow::Result<Self> {
        let repo = std::env::var(ENV_REPO)
            .with_context(|| format!("{ENV_REPO} must be set when no config file exists"))?;
        let mut config = Config::new(repo.parse()?);
        config.apply_env()?;
        Ok(config)
    }

    /// Overrides credentials and repository from the environment.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var(ENV_TOKEN).filter(|t| !t.is_empty()) {
            self.remote.token = Some(Token::new(token));
        }
        if let Some(repo) = var(ENV_REPO).filter(|r| !r.is_empty()) {
            self.remote.repo = repo.parse()?;
        }
        if let Some(branch) = var(ENV_BRANCH).filter(|b| !b.is_empty()) {
            self.remote.branch = branch;
        }
        Ok(())
    }
}
