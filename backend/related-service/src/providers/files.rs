//! File shares, the always-on provider.

use crate::clients::{FilesShareQuery, IdentityClient};
use crate::error::ServiceResult;
use crate::models::{FederatedIdentity, FilesShareRow, IdentityKind, RelatedResource};
use crate::providers::{keyword_tokens, ResourceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct FilesProvider {
    shares: Arc<dyn FilesShareQuery>,
    identity: Arc<dyn IdentityClient>,
    frontend_base_url: String,
}

impl FilesProvider {
    pub const PROVIDER_ID: &'static str = "files";

    pub fn new(
        shares: Arc<dyn FilesShareQuery>,
        identity: Arc<dyn IdentityClient>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shares,
            identity,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    async fn rows_for_entity(&self, entity: &FederatedIdentity) -> ServiceResult<Vec<FilesShareRow>> {
        match entity.kind {
            IdentityKind::User => self.shares.shares_to_user(&entity.user_id).await,
            IdentityKind::Group => self.shares.shares_to_group(&entity.user_id).await,
            IdentityKind::Circle => self.shares.shares_to_circle(&entity.single_id).await,
        }
    }

    fn convert(&self, share: &FilesShareRow) -> RelatedResource {
        let mut related = RelatedResource::new(Self::PROVIDER_ID, share.file_id.to_string());
        related.title = share.file_target.trim_start_matches('/').to_string();
        related.subtitle = "Files".to_string();
        related.tooltip = format!("File '{}'", share.file_target);
        related.url = format!("{}/f/{}", self.frontend_base_url, share.file_id);

        related.set_meta(RelatedResource::ITEM_OWNER, share.file_owner.as_str());
        if share.file_last_update > 0 {
            related.set_meta(RelatedResource::ITEM_LAST_UPDATE, share.file_last_update);
        }
        related.set_meta(RelatedResource::LINK_CREATOR, share.share_creator.as_str());
        if share.share_time > 0 {
            related.set_meta(RelatedResource::LINK_CREATION, share.share_time);
        }
        related.set_meta(
            RelatedResource::ITEM_KEYWORDS,
            keyword_tokens(&share.file_target),
        );

        related.virtual_group.insert(share.share_creator.clone());
        related.virtual_group.insert(share.shared_with.clone());
        if matches!(
            share.share_kind.parse(),
            Ok(IdentityKind::Group | IdentityKind::Circle)
        ) {
            related.is_group_shared = true;
            related.recipients.insert(share.shared_with.clone());
        }

        related
    }
}

#[async_trait]
impl ResourceProvider for FilesProvider {
    fn provider_id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>> {
        let file_id = item_id.parse::<i64>().unwrap_or(0);
        // 0 and 1 come out of failed casts upstream, never real files
        if file_id <= 1 {
            return Ok(Vec::new());
        }

        let shares = self.shares.shares_by_item(file_id).await?;
        let mut recipients = Vec::new();
        for share in &shares {
            let Ok(kind) = share.share_kind.parse::<IdentityKind>() else {
                debug!(file_id, kind = %share.share_kind, "Skipping share with unknown recipient kind");
                continue;
            };
            match self.identity.federated_user(&share.shared_with, kind).await {
                Ok(entity) => recipients.push(entity),
                Err(e) => {
                    debug!(file_id, recipient = %share.shared_with, error = %e,
                        "Skipping unresolvable share recipient");
                }
            }
        }

        Ok(recipients)
    }

    async fn related_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<RelatedResource>> {
        let shares = self.rows_for_entity(entity).await?;
        Ok(shares.iter().map(|share| self.convert(share)).collect())
    }

    async fn items_available_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<String>> {
        let shares = self.rows_for_entity(entity).await?;
        let mut ids: Vec<String> = shares
            .iter()
            .map(|share| share.file_id.to_string())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Replace the generic share target with the viewer's own target
    /// path for the same file, when one exists.
    async fn improve_related_resource(
        &self,
        viewer: &FederatedIdentity,
        entry: &mut RelatedResource,
    ) -> ServiceResult<()> {
        if !viewer.is_user() {
            return Ok(());
        }
        let file_id = entry.item_id.parse::<i64>().unwrap_or(0);
        if file_id <= 1 {
            return Ok(());
        }

        let shares = self.shares.shares_by_item(file_id).await?;
        if let Some(own) = shares
            .iter()
            .find(|share| share.shared_with == viewer.user_id && !share.file_target.is_empty())
        {
            entry.title = own.file_target.trim_start_matches('/').to_string();
            entry.tooltip = format!("File '{}'", own.file_target);
        }

        Ok(())
    }
}
