//! Rendering and publishing of generated sites.
//!
//! A [`SiteGenerator`] renders the collected fields into HTML, hands the page
//! to a [`Publisher`] (local file server or GitHub Pages) under a
//! [`RetryPolicy`], and stores the resulting [`ArtifactRecord`].

mod artifact;
mod assets;
mod github;
mod local;
mod pipeline;
mod renderer;
mod retry;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use artifact::{ARTIFACT_ID_LEN, ArtifactRecord, ArtifactStore, HostingUrls, new_artifact_id};
pub use assets::{AssetError, ImageFormat, LogoStore};
pub use github::GitHubPagesPublisher;
pub use local::LocalPublisher;
pub use pipeline::{GenerationError, SiteGenerator};
pub use renderer::{RenderedSite, SiteRenderer};
pub use retry::RetryPolicy;

/// Where a generated page is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostingMethod {
    #[default]
    Local,
    Github,
}

impl HostingMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for HostingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "server" => Ok(Self::Local),
            "github" | "gh" | "pages" => Ok(Self::Github),
            other => Err(format!("unknown hosting method '{other}'")),
        }
    }
}

/// A rendered page ready to publish.
#[derive(Debug, Clone)]
pub struct SitePage {
    pub id: String,
    pub title: String,
    pub html: String,
    pub custom_domain: Option<String>,
}

/// Errors from a hosting backend.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to write site file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hosting request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hosting API returned {status}: {body}")]
    Api { status: u16, body: String },
}

impl PublishError {
    /// Whether trying again later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// A hosting backend.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn method(&self) -> HostingMethod;

    async fn publish(&self, page: &SitePage) -> Result<HostingUrls, PublishError>;
}
