//! Local file server publisher.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::{HostingMethod, HostingUrls, PublishError, Publisher, SitePage};

/// Writes pages to `<sites_dir>/<id>.html`, served under `<base_url>/sites/`.
#[derive(Debug)]
pub struct LocalPublisher {
    sites_dir: PathBuf,
    base_url: String,

    /// Serializes writes into the shared sites directory.
    write_lock: Mutex<()>,
}

impl LocalPublisher {
    #[must_use]
    pub fn new(sites_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            write_lock: Mutex::new(()),
        }
    }

    /// Public URL of a page stored by this publisher.
    #[must_use]
    pub fn site_url(&self, id: &str) -> String {
        format!("{}/sites/{id}.html", self.base_url)
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    fn method(&self) -> HostingMethod {
        HostingMethod::Local
    }

    async fn publish(&self, page: &SitePage) -> Result<HostingUrls, PublishError> {
        let path = self.sites_dir.join(format!("{}.html", page.id));
        {
            let _guard = self.write_lock.lock().await;
            tokio::fs::create_dir_all(&self.sites_dir).await?;
            tokio::fs::write(&path, page.html.as_bytes()).await?;
        }
        info!("Saved generated site to {}", path.display());

        let url = self.site_url(&page.id);
        Ok(HostingUrls {
            download_url: url.clone(),
            preview_url: url,
            repo_url: None,
        })
    }
}
