//! Deck boards, surfaced through board membership rows.

use crate::clients::{DeckShareQuery, IdentityClient};
use crate::error::ServiceResult;
use crate::models::{DeckShareRow, FederatedIdentity, IdentityKind, RelatedResource};
use crate::providers::{keyword_tokens, ResourceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct DeckProvider {
    shares: Arc<dyn DeckShareQuery>,
    identity: Arc<dyn IdentityClient>,
    frontend_base_url: String,
}

impl DeckProvider {
    pub const PROVIDER_ID: &'static str = "deck";

    pub fn new(
        shares: Arc<dyn DeckShareQuery>,
        identity: Arc<dyn IdentityClient>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shares,
            identity,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    async fn rows_for_entity(&self, entity: &FederatedIdentity) -> ServiceResult<Vec<DeckShareRow>> {
        match entity.kind {
            IdentityKind::User => self.shares.boards_to_user(&entity.user_id).await,
            IdentityKind::Group => self.shares.boards_to_group(&entity.user_id).await,
            IdentityKind::Circle => self.shares.boards_to_circle(&entity.single_id).await,
        }
    }

    fn convert(&self, share: &DeckShareRow) -> RelatedResource {
        let mut related = RelatedResource::new(Self::PROVIDER_ID, share.board_id.to_string());
        related.title = share.board_name.clone();
        related.subtitle = "Deck board".to_string();
        related.tooltip = format!("Deck board '{}'", share.board_name);
        related.url = format!("{}/deck/board/{}", self.frontend_base_url, share.board_id);

        if share.last_modified > 0 {
            related.set_meta(RelatedResource::ITEM_LAST_UPDATE, share.last_modified);
        }
        related.set_meta(
            RelatedResource::ITEM_KEYWORDS,
            keyword_tokens(&share.board_name),
        );

        related.virtual_group.insert(share.participant.clone());
        if matches!(
            share.share_kind.parse(),
            Ok(IdentityKind::Group | IdentityKind::Circle)
        ) {
            related.is_group_shared = true;
            related.recipients.insert(share.participant.clone());
        }

        related
    }
}

#[async_trait]
impl ResourceProvider for DeckProvider {
    fn provider_id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>> {
        let board_id = item_id.parse::<i64>().unwrap_or(0);

        let shares = self.shares.boards_by_item(board_id).await?;
        let mut recipients = Vec::new();
        for share in &shares {
            let Ok(kind) = share.share_kind.parse::<IdentityKind>() else {
                debug!(board_id, kind = %share.share_kind, "Skipping board member with unknown kind");
                continue;
            };
            match self.identity.federated_user(&share.participant, kind).await {
                Ok(entity) => recipients.push(entity),
                Err(e) => {
                    debug!(board_id, participant = %share.participant, error = %e,
                        "Skipping unresolvable board member");
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
            .map(|share| share.board_id.to_string())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::identity::MockIdentityClient;
    use crate::clients::shares::MockDeckShareQuery;

    fn board_row(board_id: i64, name: &str, participant: &str, kind: &str) -> DeckShareRow {
        DeckShareRow {
            board_id,
            board_name: name.to_string(),
            participant: participant.to_string(),
            share_kind: kind.to_string(),
            last_modified: 1_700_000_200,
        }
    }

    #[tokio::test]
    async fn test_user_entities_are_served() {
        let mut shares = MockDeckShareQuery::new();
        shares
            .expect_boards_to_user()
            .withf(|user_id| user_id == "alice")
            .returning(|_| Ok(vec![board_row(5, "Sprint Planning", "alice", "user")]));
        let identity = MockIdentityClient::new();
        let provider = DeckProvider::new(Arc::new(shares), Arc::new(identity), "https://cloud");

        let related = provider
            .related_to_entity(&FederatedIdentity::user("s-alice", "alice"))
            .await
            .unwrap();

        assert_eq!(related.len(), 1);
        assert_eq!(related[0].provider_id, "deck");
        assert_eq!(related[0].title, "Sprint Planning");
        assert_eq!(related[0].url, "https://cloud/deck/board/5");
        assert_eq!(related[0].keywords(), ["sprint", "planning"]);
        assert_eq!(
            related[0].meta_int(RelatedResource::ITEM_LAST_UPDATE),
            1_700_000_200
        );
    }

    #[tokio::test]
    async fn test_items_available_dedupes_board_ids() {
        let mut shares = MockDeckShareQuery::new();
        shares.expect_boards_to_group().returning(|_| {
            Ok(vec![
                board_row(5, "Sprint", "staff", "group"),
                board_row(5, "Sprint", "staff", "group"),
                board_row(9, "Retro", "staff", "group"),
            ])
        });
        let identity = MockIdentityClient::new();
        let provider = DeckProvider::new(Arc::new(shares), Arc::new(identity), "https://cloud");

        let ids = provider
            .items_available_to_entity(&FederatedIdentity::group("s-staff", "staff"))
            .await
            .unwrap();

        assert_eq!(ids, ["5", "9"]);
    }
}
