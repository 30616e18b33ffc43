use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::checklist::CHECKLIST_HEADER;
use crate::error::{Error, Result};

const GITHUB_API_URL: &str = "https://api.github.com";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("ticklist/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Resolve the GitHub API token: `GITHUB_TOKEN` first, then `GH_TOKEN`.
pub fn resolve_token() -> Result<String> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = std::env::var(var)
            && !token.is_empty()
        {
            return Ok(token);
        }
    }
    Err(Error::GitHub(
        "GitHub token not found in $GITHUB_TOKEN or $GH_TOKEN".to_string(),
    ))
}

/// Resolve the owner/name repository slug: explicit config first, then the
/// `GITHUB_REPOSITORY` environment variable set by CI runners.
pub fn resolve_repo(configured: Option<&str>) -> Result<String> {
    if let Some(repo) = configured {
        return Ok(repo.to_string());
    }
    if let Ok(repo) = std::env::var("GITHUB_REPOSITORY")
        && !repo.is_empty()
    {
        return Ok(repo);
    }
    Err(Error::GitHub(
        "repository not configured and $GITHUB_REPOSITORY not set".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Client abstraction (for testability)
// ---------------------------------------------------------------------------

pub trait HttpClient {
    /// Perform an authenticated request against the GitHub API and return the
    /// raw response body. `body` is sent as JSON when present.
    fn request(
        &self,
        method: &str,
        url: &str,
        accept: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String>;
}

/// Real client with retry and exponential backoff on transient failures.
struct DefaultHttpClient {
    token: String,
}

impl HttpClient for DefaultHttpClient {
    fn request(
        &self,
        method: &str,
        url: &str,
        accept: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        for attempt in 1..=MAX_RETRIES {
            let request = ureq::request(method, url)
                .set("Authorization", &format!("Bearer {}", self.token))
                .set("Accept", accept)
                .set("User-Agent", USER_AGENT);
            let response = match body {
                Some(json) => request.send_json(json),
                None => request.call(),
            };
            match response {
                Ok(response) => {
                    return response.into_string().map_err(|e| {
                        Error::GitHub(format!("failed to read GitHub response: {e}"))
                    });
                }
                Err(ref e) if attempt < MAX_RETRIES && is_retryable(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        backoff_ms,
                        "retrying GitHub API after transient error"
                    );
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms *= 2;
                }
                Err(e) => {
                    return Err(Error::GitHub(format!("GitHub API request failed: {e}")));
                }
            }
        }
        unreachable!()
    }
}

/// Only retry rate-limits (429), server errors (5xx), and transport errors.
fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
        ureq::Error::Transport(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Comment sink
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommentUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
    user: Option<CommentUser>,
}

/// Fetches pull-request diffs and keeps at most one checklist comment per PR.
pub struct PullRequestComments {
    repo: String,
    bot_login: String,
    client: Box<dyn HttpClient>,
}

impl PullRequestComments {
    pub fn new(repo: String, bot_login: String) -> Result<Self> {
        let token = resolve_token()?;
        Ok(Self {
            repo,
            bot_login,
            client: Box::new(DefaultHttpClient { token }),
        })
    }

    #[cfg(test)]
    fn with_client(repo: &str, bot_login: &str, client: Box<dyn HttpClient>) -> Self {
        Self {
            repo: repo.to_string(),
            bot_login: bot_login.to_string(),
            client,
        }
    }

    /// Fetch the unified diff of a pull request.
    pub fn fetch_diff(&self, pr: u64) -> Result<String> {
        let url = format!("{GITHUB_API_URL}/repos/{}/pulls/{pr}", self.repo);
        let diff = self.client.request("GET", &url, DIFF_MEDIA_TYPE, None)?;
        debug!(pr, bytes = diff.len(), "fetched pull request diff");
        Ok(diff)
    }

    /// Delete a previously posted checklist comment, if any.
    ///
    /// A comment qualifies when its author login matches the configured bot
    /// login and its body contains the checklist header marker.
    pub fn delete_previous(&self, pr: u64) -> Result<()> {
        let url = format!(
            "{GITHUB_API_URL}/repos/{}/issues/{pr}/comments?per_page=100",
            self.repo
        );
        let json = self.client.request("GET", &url, JSON_MEDIA_TYPE, None)?;
        let comments: Vec<Comment> = serde_json::from_str(&json)
            .map_err(|e| Error::GitHub(format!("failed to parse comment list: {e}")))?;

        let previous = comments.iter().find(|comment| {
            comment
                .user
                .as_ref()
                .is_some_and(|user| user.login == self.bot_login)
                && comment
                    .body
                    .as_deref()
                    .is_some_and(|body| body.contains(CHECKLIST_HEADER))
        });

        if let Some(comment) = previous {
            info!(comment_id = comment.id, "deleting previous checklist comment");
            let url = format!(
                "{GITHUB_API_URL}/repos/{}/issues/comments/{}",
                self.repo, comment.id
            );
            self.client.request("DELETE", &url, JSON_MEDIA_TYPE, None)?;
        }
        Ok(())
    }

    /// Post the rendered checklist as a new PR comment.
    pub fn post(&self, pr: u64, body: &str) -> Result<()> {
        let url = format!("{GITHUB_API_URL}/repos/{}/issues/{pr}/comments", self.repo);
        let payload = serde_json::json!({ "body": body });
        self.client.request("POST", &url, JSON_MEDIA_TYPE, Some(&payload))?;
        info!(pr, "posted checklist comment");
        Ok(())
    }
}
