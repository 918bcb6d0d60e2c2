//! GitHub API client.
//!
//! Paginated repository listing with fork/archive filtering, language
//! byte counts and README retrieval. Requests are sequential; there is no
//! retry or backoff, so an exhausted rate limit surfaces as a status error.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, StatusCode};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Public GitHub API root
pub const GITHUB_API: &str = "https://api.github.com";

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("reposum/", env!("CARGO_PKG_VERSION"));

/// Timeout for metadata and README requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Items requested per listing page
const PAGE_SIZE: &str = "100";

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GitHub returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// One repository as listed by the API. Immutable once fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct Repo {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub owner: Option<RepoOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Language name to byte count for one repository, in the order the API
/// returned the keys. That order is what breaks ties in the top-K cut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageProfile(pub Vec<(String, u64)>);

impl<'de> Deserialize<'de> for LanguageProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ProfileVisitor;

        impl<'de> Visitor<'de> for ProfileVisitor {
            type Value = LanguageProfile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of language name to byte count")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, u64>()? {
                    entries.push(entry);
                }
                Ok(LanguageProfile(entries))
            }
        }

        deserializer.deserialize_map(ProfileVisitor)
    }
}

#[derive(Deserialize)]
struct ReadmeResponse {
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    content: String,
}

/// Client for the GitHub REST API.
///
/// A `GITHUB_TOKEN` environment variable, when set, is attached as a bearer
/// header for elevated rate limits; without it the client silently runs
/// against the lower unauthenticated quota.
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new() -> Result<Self, GithubError> {
        Self::with_base_url(GITHUB_API)
    }

    /// Build a client against a non-default API root.
    pub fn with_base_url(base_url: &str) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: std::env::var("GITHUB_TOKEN").ok(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// List repositories owned by `owner`, most recently updated first.
    ///
    /// Pages until the API returns an empty page. Forks and archived
    /// repositories are filtered per item, before accumulation, so paging
    /// follows the remote counts rather than the post-filter ones.
    pub async fn list_repositories(
        &self,
        owner: &str,
        include_forks: bool,
        include_archived: bool,
    ) -> Result<Vec<Repo>, GithubError> {
        let url = format!("{}/users/{}/repos", self.base_url, owner);
        let mut results = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_number = page.to_string();
            let response = self
                .get(&url)
                .query(&[
                    ("per_page", PAGE_SIZE),
                    ("page", page_number.as_str()),
                    ("type", "owner"),
                    ("sort", "updated"),
                ])
                .send()
                .await?;
            let response = check_status(response)?;
            let batch: Vec<Repo> = response.json().await?;
            if batch.is_empty() {
                break;
            }
            results.extend(
                batch
                    .into_iter()
                    .filter(|repo| keep_repo(repo, include_forks, include_archived)),
            );
            page += 1;
        }
        Ok(results)
    }

    /// Fetch the language breakdown (in bytes) for one repository.
    pub async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageProfile, GithubError> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        let response = check_status(self.get(&url).send().await?)?;
        Ok(response.json().await?)
    }

    /// Fetch a repository's README as UTF-8 text.
    ///
    /// Returns `Ok(None)` when the repository has no README (404) or when
    /// the payload is not base64 as the API normally signals.
    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<Option<String>, GithubError> {
        let url = format!("{}/repos/{}/{}/readme", self.base_url, owner, repo);
        let response = self.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let body: ReadmeResponse = response.json().await?;
        Ok(decode_readme(&body))
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GithubError::Status {
            status,
            url: response.url().to_string(),
        })
    }
}

fn keep_repo(repo: &Repo, include_forks: bool, include_archived: bool) -> bool {
    (include_forks || !repo.fork) && (include_archived || !repo.archived)
}

/// Decode the README payload. The API wraps the base64 body with embedded
/// newlines, so whitespace is stripped before decoding.
fn decode_readme(body: &ReadmeResponse) -> Option<String> {
    if body.encoding != "base64" {
        return None;
    }
    let compact: String = body.content.split_whitespace().collect();
    let bytes = STANDARD.decode(compact).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
