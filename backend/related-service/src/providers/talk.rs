//! Talk rooms, surfaced through room attendee rows.

use crate::clients::{IdentityClient, TalkRoomQuery};
use crate::error::ServiceResult;
use crate::models::{FederatedIdentity, IdentityKind, RelatedResource, TalkRoomRow};
use crate::providers::{keyword_tokens, ResourceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Base score of talk candidates; rooms are chattier than shares.
const TALK_QUALITY: f64 = 0.85;

pub struct TalkProvider {
    rooms: Arc<dyn TalkRoomQuery>,
    identity: Arc<dyn IdentityClient>,
    frontend_base_url: String,
}

impl TalkProvider {
    pub const PROVIDER_ID: &'static str = "talk";

    pub fn new(
        rooms: Arc<dyn TalkRoomQuery>,
        identity: Arc<dyn IdentityClient>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            rooms,
            identity,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    async fn rows_for_entity(&self, entity: &FederatedIdentity) -> ServiceResult<Vec<TalkRoomRow>> {
        match entity.kind {
            IdentityKind::User => Ok(Vec::new()),
            IdentityKind::Group => self.rooms.rooms_to_group(&entity.user_id).await,
            IdentityKind::Circle => self.rooms.rooms_to_circle(&entity.single_id).await,
        }
    }

    fn convert(&self, room: &TalkRoomRow) -> RelatedResource {
        let mut related = RelatedResource::new(Self::PROVIDER_ID, room.room_id.to_string());
        related.title = room.room_name.clone();
        related.subtitle = "Talk".to_string();
        related.tooltip = format!("Talk conversation '{}'", room.room_name);
        related.url = format!("{}/call/{}", self.frontend_base_url, room.token);
        related.improve(TALK_QUALITY, "talk_result", true);

        related.set_meta(
            RelatedResource::ITEM_KEYWORDS,
            keyword_tokens(&room.room_name),
        );

        related.virtual_group.insert(room.actor_id.clone());
        if matches!(
            room.actor_kind.parse(),
            Ok(IdentityKind::Group | IdentityKind::Circle)
        ) {
            related.is_group_shared = true;
            related.recipients.insert(room.actor_id.clone());
        }

        related
    }
}

#[async_trait]
impl ResourceProvider for TalkProvider {
    fn provider_id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>> {
        let room_id = item_id.parse::<i64>().unwrap_or(0);
        if room_id < 1 {
            return Ok(Vec::new());
        }

        let rooms = self.rooms.rooms_by_item(room_id).await?;
        let mut recipients = Vec::new();
        for room in &rooms {
            let Ok(kind) = room.actor_kind.parse::<IdentityKind>() else {
                debug!(room_id, kind = %room.actor_kind, "Skipping attendee with unknown kind");
                continue;
            };
            match self.identity.federated_user(&room.actor_id, kind).await {
                Ok(entity) => recipients.push(entity),
                Err(e) => {
                    debug!(room_id, actor = %room.actor_id, error = %e,
                        "Skipping unresolvable attendee");
                }
            }
        }

        Ok(recipients)
    }

    async fn related_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<RelatedResource>> {
        let rooms = self.rows_for_entity(entity).await?;
        Ok(rooms.iter().map(|room| self.convert(room)).collect())
    }

    async fn items_available_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<String>> {
        let rooms = self.rows_for_entity(entity).await?;
        let mut ids: Vec<String> = rooms.iter().map(|room| room.room_id.to_string()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
