//! GitHub client for listing a profile owner's public repositories

use crate::config::GithubConfig;
use anyhow::{Context, Result};
use devconnector_shared::GithubRepo;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Number of repositories shown on a profile page
pub const REPO_LIMIT: usize = 5;

const MAX_USERNAME_LEN: usize = 39;

/// HTTP client for the GitHub REST API
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_url: Arc<str>,
    credentials: Option<(Arc<str>, SecretString)>,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build GitHub HTTP client")?;

        let credentials = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => Some((Arc::from(id.as_str()), secret.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            api_url: Arc::from(config.api_url.trim_end_matches('/')),
            credentials,
        })
    }

    /// Oldest-first repositories for `username`, at most [`REPO_LIMIT`].
    ///
    /// `Ok(None)` means GitHub has no such user (or the name cannot be one);
    /// transport failures are errors.
    #[tracing::instrument(skip(self))]
    pub async fn recent_repos(&self, username: &str) -> Result<Option<Vec<GithubRepo>>> {
        let username = username.trim();
        if !is_valid_username(username) {
            debug!("Rejected GitHub username without lookup");
            return Ok(None);
        }

        let url = format!("{}/users/{}/repos", self.api_url, username);
        let limit = REPO_LIMIT.to_string();
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("per_page", limit.as_str()),
                ("sort", "created"),
                ("direction", "asc"),
            ]);

        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, Some(secret.expose_secret()));
        }

        let response = request
            .send()
            .await
            .context("Failed to send GitHub request")?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            status => {
                warn!(%status, "GitHub lookup failed");
                return Ok(None);
            }
        }

        let mut repos: Vec<GithubRepo> = response
            .json()
            .await
            .context("Failed to parse GitHub response")?;
        repos.truncate(REPO_LIMIT);

        Ok(Some(repos))
    }
}

/// Alphanumerics and single inner hyphens, up to 39 characters
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && !username.starts_with('-')
        && !username.ends_with('-')
        && !username.contains("--")
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
