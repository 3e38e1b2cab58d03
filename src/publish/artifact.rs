//! Generated artifact records and their in-memory store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::TemplateKind;

use super::HostingMethod;

/// Length of an artifact id in hex characters.
pub const ARTIFACT_ID_LEN: usize = 10;

/// Derives an artifact id from the project name and a random nonce.
pub fn new_artifact_id<R: Rng + ?Sized>(seed: &str, rng: &mut R) -> String {
    let nonce: u64 = rng.r#gen();
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(nonce.to_le_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ARTIFACT_ID_LEN);
    id
}

/// Where a published page can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingUrls {
    /// Direct link to the raw HTML file.
    pub download_url: String,
    /// Link that renders the page in a browser.
    pub preview_url: String,
    /// Source repository, for hosts that have one.
    pub repo_url: Option<String>,
}

/// One successful generation. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    pub template_kind: TemplateKind,
    pub rendered_content: String,
    pub hosting_urls: HostingUrls,
    pub hosting_method: HostingMethod,
    pub created_at: DateTime<Utc>,
}

struct StoredArtifact {
    record: ArtifactRecord,
    stored_at: Instant,
}

/// Artifacts by id, evicted after a fixed time to live.
pub struct ArtifactStore {
    entries: RwLock<HashMap<String, StoredArtifact>>,
    ttl: Duration,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn insert(&self, record: ArtifactRecord) {
        let mut entries = self.entries.write().await;
        debug!("Storing artifact {}", record.id);
        entries.insert(
            record.id.clone(),
            StoredArtifact {
                record,
                stored_at: Instant::now(),
            },
        );
    }

    /// Looks up a live artifact. Expired entries read as absent.
    pub async fn get(&self, id: &str) -> Option<ArtifactRecord> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|stored| stored.stored_at.elapsed() < self.ttl)
            .map(|stored| stored.record.clone())
    }

    /// Drops expired artifacts and returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, stored| stored.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn record(id: &str) -> ArtifactRecord {
        ArtifactRecord {
            id: id.to_owned(),
            template_kind: TemplateKind::Memecoin,
            rendered_content: "<html></html>".to_owned(),
            hosting_urls: HostingUrls {
                download_url: format!("http://localhost:5000/sites/{id}.html"),
                preview_url: format!("http://localhost:5000/sites/{id}.html"),
                repo_url: None,
            },
            hosting_method: HostingMethod::Local,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_artifact_id_format() {
        let mut rng = StdRng::seed_from_u64(5);
        let id = new_artifact_id("MoonElonDoge", &mut rng);
        assert_eq!(id.len(), ARTIFACT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_artifact_id("MoonElonDoge", &mut rng));
    }

    #[tokio::test]
    async fn test_store_insert_and_get() {
        let store = ArtifactStore::new(Duration::from_secs(60));
        store.insert(record("abc")).await;
        assert_eq!(store.get("abc").await.map(|r| r.id), Some("abc".to_owned()));
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_store_evicts_after_ttl() {
        let store = ArtifactStore::new(Duration::from_millis(20));
        store.insert(record("old")).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.get("old").await.is_none());
        assert_eq!(store.evict_expired().await, 1);
        assert!(store.is_empty().await);
    }
}
