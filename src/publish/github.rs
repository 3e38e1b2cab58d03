//! GitHub Pages publisher.
//!
//! Each page gets its own public repository named `<prefix><id>`. The page is
//! committed as `index.html` on `main` and Pages is enabled for that branch.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{HostingMethod, HostingUrls, PublishError, Publisher, RetryPolicy, SitePage};
use crate::config::GitHubConfig;

const ACCEPT: &str = "application/vnd.github+json";
const BRANCH: &str = "main";

/// Publishes pages as GitHub Pages repositories.
pub struct GitHubPagesPublisher {
    http: Client,
    config: GitHubConfig,
    retry: RetryPolicy,
}

impl GitHubPagesPublisher {
    /// Creates a publisher whose requests time out after `timeout`.
    pub fn new(config: GitHubConfig, timeout: Duration, retry: RetryPolicy) -> Result<Self, PublishError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            retry,
        })
    }

    #[must_use]
    pub fn repo_name(&self, id: &str) -> String {
        format!("{}{}", self.config.repo_prefix, id.to_ascii_lowercase())
    }

    /// The URLs a repository will be reachable under once Pages is live.
    #[must_use]
    pub fn urls_for(&self, repo: &str, custom_domain: Option<&str>) -> HostingUrls {
        let user = &self.config.username;
        let preview_url = custom_domain.map_or_else(
            || format!("https://{}.github.io/{repo}/", user.to_ascii_lowercase()),
            |domain| format!("https://{domain}/"),
        );
        HostingUrls {
            download_url: format!(
                "https://raw.githubusercontent.com/{user}/{repo}/{BRANCH}/index.html"
            ),
            preview_url,
            repo_url: Some(format!("https://github.com/{user}/{repo}")),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, PublishError> {
        let response = request
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PublishError::Api {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            })
        }
    }

    async fn create_repository(&self, repo: &str, title: &str) -> Result<RepoStatus, PublishError> {
        let payload = repo_payload(repo, title);
        let status = self
            .retry
            .run("create repository", || {
                let request = self.http.post(self.api("/user/repos")).json(&payload);
                async move { repo_status(self.send(request).await.map(drop)) }
            })
            .await?;
        match status {
            RepoStatus::Created => info!("Created repository: {}", repo),
            RepoStatus::Existing => info!("Reusing repository {} from an earlier attempt", repo),
        }
        Ok(status)
    }

    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        status: RepoStatus,
    ) -> Result<(), PublishError> {
        let url = self.api(&format!("/repos/{}/{repo}/contents/{path}", self.config.username));
        let sha = match status {
            RepoStatus::Created => None,
            RepoStatus::Existing => self.file_sha(&url).await?,
        };
        let payload = file_payload(content, message, sha.as_deref());
        self.retry
            .run("upload file", || self.send(self.http.put(&url).json(&payload)))
            .await?;
        debug!("Added {} to {}", path, repo);
        Ok(())
    }

    /// Blob sha of a file already in the repository. Overwriting requires it.
    async fn file_sha(&self, url: &str) -> Result<Option<String>, PublishError> {
        let response = match self.send(self.http.get(url)).await {
            Ok(response) => response,
            Err(PublishError::Api { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let body: Value = response.json().await?;
        Ok(body.get("sha").and_then(Value::as_str).map(str::to_owned))
    }

    async fn enable_pages(&self, repo: &str) -> Result<(), PublishError> {
        let url = self.api(&format!("/repos/{}/{repo}/pages", self.config.username));
        let payload = pages_payload();
        self.retry
            .run("enable pages", || self.send(self.http.post(&url).json(&payload)))
            .await?;
        Ok(())
    }
}

/// Whether a repository was created by this run or left by an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepoStatus {
    Created,
    Existing,
}

/// Maps a create call onto [`RepoStatus`].
///
/// Repository names carry the artifact id, so a name that is already taken
/// belongs to an earlier attempt for the same artifact, e.g. one whose
/// response was lost to a timeout.
fn repo_status(result: Result<(), PublishError>) -> Result<RepoStatus, PublishError> {
    match result {
        Ok(()) => Ok(RepoStatus::Created),
        Err(e) if is_name_taken(&e) => Ok(RepoStatus::Existing),
        Err(e) => Err(e),
    }
}

fn is_name_taken(error: &PublishError) -> bool {
    matches!(error, PublishError::Api { status: 422, body } if body.contains("already exists"))
}

fn repo_payload(repo: &str, title: &str) -> Value {
    json!({
        "name": repo,
        "description": format!("Landing page for {title}"),
        "private": false,
        "auto_init": false
    })
}

fn file_payload(content: &str, message: &str, sha: Option<&str>) -> Value {
    let mut payload = json!({
        "message": message,
        "content": STANDARD.encode(content.as_bytes()),
        "branch": BRANCH
    });
    if let Some(sha) = sha {
        payload["sha"] = Value::from(sha);
    }
    payload
}

fn pages_payload() -> Value {
    json!({ "source": { "branch": BRANCH, "path": "/" } })
}

fn readme(title: &str) -> String {
    format!("# {title}\n\nThis is an automatically generated landing page for {title}.\n")
}

#[async_trait]
impl Publisher for GitHubPagesPublisher {
    fn method(&self) -> HostingMethod {
        HostingMethod::Github
    }

    async fn publish(&self, page: &SitePage) -> Result<HostingUrls, PublishError> {
        let repo = self.repo_name(&page.id);

        let status = self.create_repository(&repo, &page.title).await?;
        self.put_file(&repo, "index.html", &page.html, "Initial site commit", status)
            .await?;

        if let Err(e) = self
            .put_file(&repo, "README.md", &readme(&page.title), "Add README", status)
            .await
        {
            warn!("Failed to add README to {}: {}", repo, e);
        }

        if let Some(domain) = &page.custom_domain {
            if let Err(e) = self
                .put_file(&repo, "CNAME", domain, "Add custom domain", status)
                .await
            {
                warn!("Failed to add CNAME to {}: {}", repo, e);
            }
        }

        // Pages can lag behind the commit; the site usually still comes up.
        if let Err(e) = self.enable_pages(&repo).await {
            warn!("GitHub Pages setup failed for {}: {}", repo, e);
        }

        let urls = self.urls_for(&repo, page.custom_domain.as_deref());
        info!("Published {} to {}", page.id, urls.preview_url);
        Ok(urls)
    }
}

impl std::fmt::Debug for GitHubPagesPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubPagesPublisher")
            .field("username", &self.config.username)
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn publisher() -> GitHubPagesPublisher {
        let config = GitHubConfig::new("token".to_owned(), "SiteBuilder".to_owned());
        GitHubPagesPublisher::new(config, Duration::from_secs(5), RetryPolicy::none()).unwrap()
    }

    #[test]
    fn test_repo_name_uses_prefix() {
        assert_eq!(publisher().repo_name("AB12CD34EF"), "site-ab12cd34ef");
    }

    #[test]
    fn test_urls_for_repo() {
        let urls = publisher().urls_for("site-abc", None);
        assert_eq!(urls.preview_url, "https://sitebuilder.github.io/site-abc/");
        assert_eq!(
            urls.download_url,
            "https://raw.githubusercontent.com/SiteBuilder/site-abc/main/index.html"
        );
        assert_eq!(urls.repo_url.as_deref(), Some("https://github.com/SiteBuilder/site-abc"));
    }

    #[test]
    fn test_urls_for_custom_domain() {
        let urls = publisher().urls_for("site-abc", Some("mycoin.com"));
        assert_eq!(urls.preview_url, "https://mycoin.com/");
    }

    fn name_taken() -> PublishError {
        PublishError::Api {
            status: 422,
            body: r#"{"message":"Repository creation failed.","errors":[{"resource":"Repository","code":"custom","field":"name","message":"name already exists on this account"}]}"#
                .chars()
                .take(200)
                .collect(),
        }
    }

    #[test]
    fn test_file_payload_is_base64() {
        let payload = file_payload("<html></html>", "Initial site commit", None);
        assert_eq!(payload["content"], "PGh0bWw+PC9odG1sPg==");
        assert_eq!(payload["branch"], "main");
        assert!(payload.get("sha").is_none());
    }

    #[test]
    fn test_file_payload_overwrite_carries_sha() {
        let payload = file_payload("<html></html>", "Initial site commit", Some("3d21ec5"));
        assert_eq!(payload["sha"], "3d21ec5");
    }

    #[test]
    fn test_repo_status_mapping() {
        assert_eq!(repo_status(Ok(())).unwrap(), RepoStatus::Created);
        assert_eq!(repo_status(Err(name_taken())).unwrap(), RepoStatus::Existing);

        let other = PublishError::Api {
            status: 422,
            body: "Validation Failed".to_owned(),
        };
        assert!(repo_status(Err(other)).is_err());
    }

    #[tokio::test]
    async fn test_create_retried_after_lost_response_reuses_repo() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let status = RetryPolicy::new(3, Duration::ZERO)
            .run("create repository", move || async move {
                let result = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PublishError::Api {
                        status: 502,
                        body: "Bad Gateway".to_owned(),
                    })
                } else {
                    Err(name_taken())
                };
                repo_status(result)
            })
            .await
            .unwrap();

        assert_eq!(status, RepoStatus::Existing);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_repo_and_pages_payloads() {
        let repo = repo_payload("site-abc", "Moon Elon Doge");
        assert_eq!(repo["private"], false);
        assert_eq!(repo["description"], "Landing page for Moon Elon Doge");
        assert_eq!(pages_payload()["source"]["path"], "/");
    }
}
