//! GitHub contents-API template source.
//!
//! Lists `/repos/{owner}/{repo}/contents/{path}?ref={branch}` recursively and
//! downloads each file from the `download_url` the listing returns. Requests
//! are retried a fixed number of times with linear back-off; `GITHUB_TOKEN`
//! is sent as a bearer token when set.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::thread::sleep;
use std::time::Duration;

use serde::Deserialize;

use ideal_core::WorkflowSettings;

use crate::error::{unavailable, SyncError};
use crate::paths::normalize_path;
use crate::source::{is_installable, RemoteEntry, TemplateSource, TemplateVersion, VERSION_FILE};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("ideal-cli/", env!("CARGO_PKG_VERSION"));
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// `owner/repo` + branch + sub-path inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl RepoRef {
    /// Parse `owner/repo`; returns `None` for anything else.
    pub fn new(repo: &str, branch: &str, path: &str) -> Option<Self> {
        let (owner, name) = repo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: name.to_string(),
            branch: branch.to_string(),
            path: normalize_path(path).trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &WorkflowSettings) -> Option<Self> {
        Self::new(
            &settings.template_repo,
            &settings.template_branch,
            &settings.template_path,
        )
    }

    fn contents_url(&self, sub: &str) -> String {
        let full = [self.path.as_str(), sub]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{API_BASE}/repos/{}/{}/contents/{full}?ref={}",
            self.owner, self.repo, self.branch
        )
    }

    fn raw_url(&self, sub: &str) -> String {
        let prefix = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}/", self.path)
        };
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{prefix}{sub}",
            self.owner, self.repo, self.branch
        )
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}:{}", self.owner, self.repo, self.branch, self.path)
    }
}

/// One item of a contents-API directory listing.
#[derive(Debug, Clone, Deserialize)]
struct ContentItem {
    path: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// Template source backed by a GitHub repository.
pub struct GitHubSource {
    repo: RepoRef,
    agent: ureq::Agent,
    token: Option<String>,
    download_urls: RefCell<HashMap<String, String>>,
}

impl GitHubSource {
    pub fn new(repo: RepoRef) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            repo,
            agent,
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            download_urls: RefCell::new(HashMap::new()),
        }
    }

    fn get(&self, url: &str) -> Result<ureq::Response, SyncError> {
        let mut last_err = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            tracing::debug!("GET {url} (attempt {attempt})");
            let mut req = self
                .agent
                .get(url)
                .set("User-Agent", USER_AGENT)
                .set("Accept", "application/vnd.github.v3+json");
            if let Some(token) = &self.token {
                req = req.set("Authorization", &format!("Bearer {token}"));
            }
            match req.call() {
                Ok(resp) => return Ok(resp),
                // Client errors other than rate limiting will not improve.
                Err(ureq::Error::Status(code, _)) if (400..500).contains(&code) && code != 429 => {
                    return Err(unavailable(format!("{url}: HTTP {code}")));
                }
                Err(e) => last_err = e.to_string(),
            }
            if attempt < MAX_ATTEMPTS {
                sleep(RETRY_DELAY * attempt);
            }
        }
        Err(unavailable(format!(
            "{url}: {last_err} (after {MAX_ATTEMPTS} attempts)"
        )))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let mut body = Vec::new();
        self.get(url)?
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| unavailable(format!("{url}: {e}")))?;
        Ok(body)
    }

    fn list_dir(&self, sub: &str, out: &mut Vec<RemoteEntry>) -> Result<(), SyncError> {
        let url = self.repo.contents_url(sub);
        let items: Vec<ContentItem> = self
            .get(&url)?
            .into_json()
            .map_err(|e| unavailable(format!("malformed listing from {url}: {e}")))?;

        for item in items {
            let Some(key) = self.relative(&item.path) else {
                continue;
            };
            if !is_installable(&key) {
                continue;
            }
            match item.kind.as_str() {
                "dir" => self.list_dir(&key, out)?,
                "file" => {
                    if let Some(download) = item.download_url {
                        self.download_urls.borrow_mut().insert(key.clone(), download);
                    }
                    out.push(RemoteEntry { path: key, size: item.size });
                }
                other => tracing::debug!("ignoring {other} entry {}", item.path),
            }
        }
        Ok(())
    }

    /// Strip the template sub-path from a repository path.
    fn relative(&self, repo_path: &str) -> Option<String> {
        let repo_path = normalize_path(repo_path);
        if self.repo.path.is_empty() {
            return Some(repo_path);
        }
        repo_path
            .strip_prefix(&format!("{}/", self.repo.path))
            .map(str::to_string)
    }
}

impl TemplateSource for GitHubSource {
    fn describe(&self) -> String {
        self.repo.to_string()
    }

    fn list_files(&self) -> Result<Vec<RemoteEntry>, SyncError> {
        let mut entries = Vec::new();
        self.list_dir("", &mut entries)?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn fetch_content(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        let key = normalize_path(path);
        let url = self
            .download_urls
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.repo.raw_url(&key));
        self.get_bytes(&url)
    }

    fn version_info(&self) -> Result<TemplateVersion, SyncError> {
        let url = self.repo.raw_url(VERSION_FILE);
        let body = self.get_bytes(&url)?;
        serde_json::from_slice(&body)
            .map_err(|e| unavailable(format!("malformed {VERSION_FILE}: {e}")))
    }
}
