//! Cache-through reads of the two provider lookups the engine repeats:
//! recipients of an item, and candidates related to an entity.

use crate::cache::RelatedCache;
use crate::error::ServiceResult;
use crate::models::{FederatedIdentity, RelatedResource};
use crate::providers::{ProviderRegistry, ResourceProvider};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProviderLookup {
    cache: RelatedCache,
    registry: Arc<ProviderRegistry>,
}

impl ProviderLookup {
    pub fn new(cache: RelatedCache, registry: Arc<ProviderRegistry>) -> Self {
        Self { cache, registry }
    }

    pub fn provider(&self, provider_id: &str) -> ServiceResult<Arc<dyn ResourceProvider>> {
        self.registry.get(provider_id)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Current recipients of an item, served from cache when fresh.
    pub async fn shares_recipients(
        &self,
        provider_id: &str,
        item_id: &str,
    ) -> ServiceResult<Vec<FederatedIdentity>> {
        if let Some(cached) = self.cache.recipients(provider_id, item_id).await {
            return Ok(cached);
        }

        let recipients = self
            .registry
            .get(provider_id)?
            .shares_recipients(item_id)
            .await?;
        self.cache
            .store_recipients(provider_id, item_id, &recipients)
            .await;
        Ok(recipients)
    }

    /// Candidates a provider relates to an entity, cache first.
    pub async fn related_to_entity(
        &self,
        provider: &Arc<dyn ResourceProvider>,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<RelatedResource>> {
        if let Some(cached) = self
            .cache
            .related(provider.provider_id(), &entity.single_id)
            .await
        {
            return Ok(cached);
        }

        let related = provider.related_to_entity(entity).await?;
        self.cache
            .store_related(provider.provider_id(), &entity.single_id, &related)
            .await;
        Ok(related)
    }

    pub async fn flush(&self) -> ServiceResult<()> {
        self.cache.flush().await
    }
}
