//! Render, publish, record.

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{error, info, warn};

use super::{
    ArtifactRecord, ArtifactStore, GitHubPagesPublisher, HostingMethod, LocalPublisher,
    PublishError, Publisher, RetryPolicy, SitePage, SiteRenderer,
};
use crate::dialogue::GenerationRequest;

/// Errors from one generation run. All of them leave the session recoverable.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to render site: {0}")]
    Render(#[from] minijinja::Error),

    #[error("Failed to publish site: {0}")]
    Publish(#[from] PublishError),
}

/// Turns generation requests into published artifacts.
pub struct SiteGenerator {
    renderer: SiteRenderer,
    local: LocalPublisher,
    github: Option<GitHubPagesPublisher>,
    retry: RetryPolicy,
    artifacts: Arc<ArtifactStore>,
}

impl SiteGenerator {
    #[must_use]
    pub fn new(
        renderer: SiteRenderer,
        local: LocalPublisher,
        github: Option<GitHubPagesPublisher>,
        retry: RetryPolicy,
        artifacts: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            renderer,
            local,
            github,
            retry,
            artifacts,
        }
    }

    #[must_use]
    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    /// Picks the publisher for `method`, falling back to local hosting when
    /// GitHub is not configured.
    fn publisher_for(&self, method: HostingMethod) -> &dyn Publisher {
        match (method, &self.github) {
            (HostingMethod::Github, Some(github)) => github,
            (HostingMethod::Github, None) => {
                warn!("GitHub hosting requested but not configured, publishing locally");
                &self.local
            }
            (HostingMethod::Local, _) => &self.local,
        }
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ArtifactRecord, GenerationError> {
        // Seeded from the artifact id so a retried request renders the same fallbacks.
        let mut rng = StdRng::seed_from_u64(seed_from_id(&request.artifact_id));
        let site = self
            .renderer
            .render(request.kind, &request.fields, &mut rng)
            .inspect_err(|e| error!("Rendering {} failed: {}", request.artifact_id, e))?;

        let page = SitePage {
            id: request.artifact_id.clone(),
            title: site.title,
            html: site.html,
            custom_domain: request.custom_domain.clone(),
        };

        let publisher = self.publisher_for(request.hosting_method);
        let method = publisher.method();
        // The GitHub publisher retries each API call itself.
        let urls = match method {
            HostingMethod::Local => {
                self.retry
                    .run("local publish", || publisher.publish(&page))
                    .await
            }
            HostingMethod::Github => publisher.publish(&page).await,
        }
        .inspect_err(|e| error!("Publishing {} failed: {}", page.id, e))?;

        let record = ArtifactRecord {
            id: page.id,
            template_kind: request.kind,
            rendered_content: page.html,
            hosting_urls: urls,
            hosting_method: method,
            created_at: Utc::now(),
        };
        info!(
            "Generated {} site {} via {}: {}",
            record.template_kind, record.id, method, record.hosting_urls.preview_url
        );
        self.artifacts.insert(record.clone()).await;
        Ok(record)
    }
}

fn seed_from_id(id: &str) -> u64 {
    u64::from_str_radix(id, 16).unwrap_or_else(|_| {
        id.bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
    })
}

impl std::fmt::Debug for SiteGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteGenerator")
            .field("local", &self.local)
            .field("github", &self.github.is_some())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{Catalog, TemplateKind};
    use crate::dialogue::FieldMap;

    fn generator(dir: &std::path::Path) -> SiteGenerator {
        SiteGenerator::new(
            SiteRenderer::new(&Catalog::builtin()).unwrap(),
            LocalPublisher::new(dir, "http://localhost:5000"),
            None,
            RetryPolicy::none(),
            Arc::new(ArtifactStore::new(Duration::from_secs(60))),
        )
    }

    fn request(method: HostingMethod) -> GenerationRequest {
        let mut fields = FieldMap::defaults();
        fields.set("coin_name", "MoonElonDoge").unwrap();
        GenerationRequest {
            artifact_id: "ab12cd34ef".to_owned(),
            kind: TemplateKind::Memecoin,
            fields: fields.flatten(),
            hosting_method: method,
            custom_domain: None,
        }
    }

    #[tokio::test]
    async fn test_generate_publishes_and_stores() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path());

        let record = generator.generate(&request(HostingMethod::Local)).await.unwrap();
        assert_eq!(record.id, "ab12cd34ef");
        assert_eq!(
            record.hosting_urls.preview_url,
            "http://localhost:5000/sites/ab12cd34ef.html"
        );
        assert!(record.rendered_content.contains("Moon Elon Doge"));
        assert!(dir.path().join("ab12cd34ef.html").exists());
        assert!(generator.artifacts().get("ab12cd34ef").await.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_github_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let record = generator(dir.path())
            .generate(&request(HostingMethod::Github))
            .await
            .unwrap();
        assert_eq!(record.hosting_method, HostingMethod::Local);
        assert!(record.hosting_urls.repo_url.is_none());
    }

    #[test]
    fn test_seed_from_id_is_stable() {
        assert_eq!(seed_from_id("ab12cd34ef"), 0xab12_cd34_ef);
        assert_eq!(seed_from_id("not-hex"), seed_from_id("not-hex"));
    }
}
