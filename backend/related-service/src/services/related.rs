//! The ranking orchestrator.
//!
//! One request runs end to end: resolve the home item's recipients,
//! fan out every (provider, recipient) candidate fetch, merge and
//! dedupe, filter by viewer access, weight against the home item's own
//! reference records and return a sorted, truncated page.

use crate::error::ServiceResult;
use crate::metrics;
use crate::models::{FederatedIdentity, IdentityKind, RelatedResource};
use crate::providers::ResourceProvider;
use crate::services::access::AccessFilter;
use crate::services::aggregation::{AddOutcome, CandidateSet};
use crate::services::lookup::ProviderLookup;
use crate::services::weights::{self, WeightCalculator};
use crate::clients::IdentityClient;
use futures::future;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct RelatedService {
    lookup: ProviderLookup,
    access: AccessFilter,
    identity: Arc<dyn IdentityClient>,
    calculators: Vec<Arc<dyn WeightCalculator>>,
    fetch_timeout: Duration,
}

impl RelatedService {
    pub fn new(
        lookup: ProviderLookup,
        identity: Arc<dyn IdentityClient>,
        fetch_timeout: Duration,
    ) -> Self {
        let mut calculators = weights::builtin_calculators();
        for provider in lookup.registry().iter() {
            for calculator in provider.weight_calculators() {
                info!(
                    provider_id = provider.provider_id(),
                    calculator = calculator.name(),
                    "Registering provider weight calculator"
                );
                calculators.push(calculator);
            }
        }

        Self {
            access: AccessFilter::new(identity.clone()),
            lookup,
            identity,
            calculators,
            fetch_timeout,
        }
    }

    /// Resolve the header-supplied user id into the viewer identity.
    pub async fn resolve_viewer(&self, user_id: &str) -> ServiceResult<FederatedIdentity> {
        self.identity
            .federated_user(user_id, IdentityKind::User)
            .await
    }

    pub async fn flush_cache(&self) -> ServiceResult<()> {
        self.lookup.flush().await
    }

    /// Rank everything related to `(provider_id, item_id)` as seen by
    /// `viewer`. A negative `limit` returns the full set.
    pub async fn related_to_item(
        &self,
        viewer: &FederatedIdentity,
        provider_id: &str,
        item_id: &str,
        limit: i64,
        resource_type: Option<&str>,
    ) -> ServiceResult<Vec<RelatedResource>> {
        // resolve the home provider up front so an unknown id fails the
        // same way on cold and warm caches
        self.lookup.provider(provider_id)?;

        let recipients = self.lookup.shares_recipients(provider_id, item_id).await?;
        let valid_ids: HashSet<String> = recipients
            .iter()
            .map(|recipient| recipient.single_id.clone())
            .collect();
        debug!(
            provider_id,
            item_id,
            recipients = recipients.len(),
            "Aggregating related candidates"
        );

        // fan out all (provider, recipient) fetches at once
        let mut fetches = Vec::new();
        for provider in self.lookup.registry().iter() {
            for recipient in &recipients {
                fetches.push(self.fetch_candidates(provider, recipient));
            }
        }
        let batches = future::join_all(fetches).await;

        // single-writer merge in submission order keeps ties deterministic
        let mut set = CandidateSet::new(provider_id, item_id);
        let recipient_count = recipients.len();
        for (slot, batch) in batches.into_iter().enumerate() {
            let recipient = &recipients[slot % recipient_count];
            for candidate in batch {
                if let AddOutcome::New(index) = set.absorb(candidate, recipient) {
                    self.apply_spread_penalty(&mut set, index, &valid_ids).await;
                }
            }
        }

        let (candidates, references) = set.into_parts();
        let mut result = self.access.filter(viewer, candidates, &self.lookup).await;

        if !references.is_empty() {
            for calculator in &self.calculators {
                calculator.weight(&references, &mut result);
            }
        }

        // stable sort, so equal scores keep their aggregation order
        result.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        if let Some(resource_type) = resource_type {
            result.retain(|entry| entry.provider_id == resource_type);
        }
        if limit >= 0 {
            result.truncate(limit as usize);
        }

        // enrich only the page that is actually returned
        for entry in &mut result {
            if let Ok(provider) = self.lookup.provider(&entry.provider_id) {
                if let Err(e) = provider.improve_related_resource(viewer, entry).await {
                    debug!(provider_id = %entry.provider_id, item_id = %entry.item_id,
                        error = %e, "Entry enrichment failed, keeping generic display fields");
                }
            }
        }

        Ok(result)
    }

    async fn fetch_candidates(
        &self,
        provider: &Arc<dyn ResourceProvider>,
        recipient: &FederatedIdentity,
    ) -> Vec<RelatedResource> {
        match tokio::time::timeout(
            self.fetch_timeout,
            self.lookup.related_to_entity(provider, recipient),
        )
        .await
        {
            Ok(Ok(related)) => related,
            Ok(Err(e)) => {
                warn!(provider_id = provider.provider_id(), entity = %recipient.single_id,
                    error = %e, "Provider fetch failed, skipping recipient");
                metrics::record_provider_failure(provider.provider_id());
                Vec::new()
            }
            Err(_) => {
                warn!(provider_id = provider.provider_id(), entity = %recipient.single_id,
                    "Provider fetch timed out, skipping recipient");
                metrics::record_provider_failure(provider.provider_id());
                Vec::new()
            }
        }
    }

    /// Items also shared outside the home item's own recipient set are
    /// broadly shared and less specific to this context.
    async fn apply_spread_penalty(
        &self,
        set: &mut CandidateSet,
        index: usize,
        valid_ids: &HashSet<String>,
    ) {
        let (spread_provider, spread_item) = {
            let entry = set.candidate_mut(index);
            (entry.provider_id.clone(), entry.item_id.clone())
        };

        let spread = match self
            .lookup
            .shares_recipients(&spread_provider, &spread_item)
            .await
        {
            Ok(spread) => spread,
            Err(e) => {
                warn!(provider_id = %spread_provider, item_id = %spread_item, error = %e,
                    "Spread lookup failed, skipping over-share penalty");
                return;
            }
        };

        let entry = set.candidate_mut(index);
        for recipient in &spread {
            if !valid_ids.contains(&recipient.single_id) {
                entry.improve(RelatedResource::UNRELATED, "unrelated", false);
            }
        }
    }
}
