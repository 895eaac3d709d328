//! Resource providers: one adapter per shareable item source.
//!
//! Every provider answers the same three questions about its own item
//! space: who is an item shared to, what else is shared to an entity,
//! and which item ids can an entity see at all. The registry maps
//! provider ids to concrete adapters and is assembled once at startup.

pub mod calendar;
pub mod deck;
pub mod files;
pub mod talk;

pub use calendar::CalendarProvider;
pub use deck::DeckProvider;
pub use files::FilesProvider;
pub use talk::TalkProvider;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{FederatedIdentity, RelatedResource};
use crate::services::weights::WeightCalculator;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    fn provider_id(&self) -> &'static str;

    /// Every identity the item is currently shared to.
    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>>;

    /// Candidate records for everything this provider shares to the entity.
    async fn related_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<RelatedResource>>;

    /// Item ids the entity can reach in this provider, for access rechecks.
    async fn items_available_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<String>>;

    /// Late display enrichment of an already-ranked entry for this viewer.
    async fn improve_related_resource(
        &self,
        _viewer: &FederatedIdentity,
        _entry: &mut RelatedResource,
    ) -> ServiceResult<()> {
        Ok(())
    }

    /// Extra scoring rules this provider contributes to the engine.
    fn weight_calculators(&self) -> Vec<Arc<dyn WeightCalculator>> {
        Vec::new()
    }
}

/// Startup-assembled mapping from provider id to adapter.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ResourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn ResourceProvider>) -> ServiceResult<()> {
        if self
            .providers
            .iter()
            .any(|known| known.provider_id() == provider.provider_id())
        {
            return Err(ServiceError::Config(format!(
                "provider '{}' registered twice",
                provider.provider_id()
            )));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn get(&self, provider_id: &str) -> ServiceResult<Arc<dyn ResourceProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.provider_id() == provider_id)
            .cloned()
            .ok_or_else(|| ServiceError::ProviderNotFound(provider_id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceProvider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a display name into lowercase keyword tokens.
pub(crate) fn keyword_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .trim_start_matches('/')
        .split(['/', '_', '-', '.', ' '])
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
