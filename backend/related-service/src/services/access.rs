//! Viewer access filtering.
//!
//! A candidate stays in the result only when the viewer's reachability
//! can be positively verified; any doubt drops the record.

use crate::clients::{IdentityClient, LinkError};
use crate::metrics;
use crate::models::{FederatedIdentity, RelatedResource};
use crate::services::lookup::ProviderLookup;
use std::sync::Arc;
use tracing::warn;

pub struct AccessFilter {
    identity: Arc<dyn IdentityClient>,
}

impl AccessFilter {
    pub fn new(identity: Arc<dyn IdentityClient>) -> Self {
        Self { identity }
    }

    pub async fn filter(
        &self,
        viewer: &FederatedIdentity,
        candidates: Vec<RelatedResource>,
        lookup: &ProviderLookup,
    ) -> Vec<RelatedResource> {
        let mut kept = Vec::with_capacity(candidates.len());
        for entry in candidates {
            if self.allows(viewer, &entry, lookup).await {
                kept.push(entry);
            }
        }
        kept
    }

    async fn allows(
        &self,
        viewer: &FederatedIdentity,
        entry: &RelatedResource,
        lookup: &ProviderLookup,
    ) -> bool {
        let recipient = entry.link_recipient();
        if recipient.is_empty() {
            metrics::record_dropped_candidate("no_link_recipient");
            return false;
        }

        match self.identity.link(recipient, &viewer.single_id).await {
            Ok(()) => true,
            Err(LinkError::NotFound) => {
                // owners always see their own items
                if viewer.is_user()
                    && entry.has_meta(RelatedResource::ITEM_OWNER)
                    && entry.item_owner() == viewer.user_id
                {
                    return true;
                }

                // slower recheck against the authoritative recipient
                // list; direct user shares have no membership link
                match lookup
                    .shares_recipients(&entry.provider_id, &entry.item_id)
                    .await
                {
                    Ok(recipients) => {
                        if recipients
                            .iter()
                            .any(|recipient| recipient.single_id == viewer.single_id)
                        {
                            true
                        } else {
                            metrics::record_dropped_candidate("not_reachable");
                            false
                        }
                    }
                    Err(e) => {
                        warn!(provider_id = %entry.provider_id, item_id = %entry.item_id,
                            error = %e, "Recipient recheck failed, dropping candidate");
                        metrics::record_dropped_candidate("recheck_failed");
                        false
                    }
                }
            }
            Err(LinkError::Lookup(reason)) => {
                warn!(provider_id = %entry.provider_id, item_id = %entry.item_id,
                    reason = %reason, "Link lookup failed, dropping candidate");
                metrics::record_dropped_candidate("link_unverifiable");
                false
            }
        }
    }
}
