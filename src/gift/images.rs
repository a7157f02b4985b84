//! Caching wrapper for gift artwork lookups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::ImageResolver;

/// Caches positive lookups of an inner [`ImageResolver`].
///
/// Misses are not cached, so a gift added to the catalogue later is picked up
/// on its next alert.
pub struct CachedImageResolver {
    inner: Arc<dyn ImageResolver>,
    hits: RwLock<HashMap<String, String>>,
}

impl CachedImageResolver {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn ImageResolver>) -> Self {
        Self {
            inner,
            hits: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ImageResolver for CachedImageResolver {
    async fn resolve_image(&self, normalized_gift_name: &str) -> Option<String> {
        if let Some(url) = self.hits.read().await.get(normalized_gift_name) {
            return Some(url.clone());
        }
        let url = self.inner.resolve_image(normalized_gift_name).await?;
        self.hits
            .write()
            .await
            .insert(normalized_gift_name.to_string(), url.clone());
        Some(url)
    }
}
