//! Shared calendars. Recipients arrive as DAV principal uris and are
//! resolved into federated identities before use.

use crate::clients::{CalendarShareQuery, IdentityClient};
use crate::error::ServiceResult;
use crate::models::{CalendarShareRow, FederatedIdentity, IdentityKind, RelatedResource};
use crate::providers::{keyword_tokens, ResourceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Base score of calendar candidates; calendars relate people, not work.
const CALENDAR_QUALITY: f64 = 0.6;

pub struct CalendarProvider {
    shares: Arc<dyn CalendarShareQuery>,
    identity: Arc<dyn IdentityClient>,
    frontend_base_url: String,
}

/// Split `principals/users/alice` into a kind and a raw id.
fn parse_principal(principal: &str) -> Option<(IdentityKind, &str)> {
    let rest = principal.strip_prefix("principals/")?;
    let (kind, raw_id) = rest.split_once('/')?;
    if raw_id.is_empty() {
        return None;
    }
    let kind = match kind {
        "users" => IdentityKind::User,
        "groups" => IdentityKind::Group,
        "circles" => IdentityKind::Circle,
        _ => return None,
    };
    Some((kind, raw_id))
}

impl CalendarProvider {
    pub const PROVIDER_ID: &'static str = "calendar";

    pub fn new(
        shares: Arc<dyn CalendarShareQuery>,
        identity: Arc<dyn IdentityClient>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shares,
            identity,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    async fn rows_for_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<CalendarShareRow>> {
        match entity.kind {
            IdentityKind::User => Ok(Vec::new()),
            IdentityKind::Group => self.shares.calendars_to_group(&entity.user_id).await,
            IdentityKind::Circle => self.shares.calendars_to_circle(&entity.single_id).await,
        }
    }

    async fn convert(&self, share: &CalendarShareRow) -> RelatedResource {
        let mut related = RelatedResource::new(Self::PROVIDER_ID, share.calendar_id.to_string());
        related.title = share.calendar_name.clone();
        related.subtitle = "Calendar".to_string();
        related.tooltip = format!("Calendar '{}'", share.calendar_name);
        related.url = format!("{}/calendar", self.frontend_base_url);
        related.improve(CALENDAR_QUALITY, "calendar_result", true);

        related.set_meta(
            RelatedResource::ITEM_KEYWORDS,
            keyword_tokens(&format!(
                "{} {}",
                share.calendar_name, share.event_summary
            )),
        );
        if share.event_date > 0 {
            related.set_meta(RelatedResource::ITEM_CREATION, share.event_date);
        }

        // owner of the calendar, as a platform-wide id
        if let Some((kind, raw_id)) = parse_principal(&share.calendar_principal) {
            match self.identity.federated_user(raw_id, kind).await {
                Ok(owner) => related.set_meta(RelatedResource::LINK_CREATOR, owner.single_id),
                Err(e) => {
                    debug!(calendar_id = share.calendar_id, error = %e,
                        "Leaving calendar owner unresolved");
                }
            }
        }

        if let Some((kind, raw_id)) = parse_principal(&share.share_principal) {
            related.virtual_group.insert(raw_id.to_string());
            if matches!(kind, IdentityKind::Group | IdentityKind::Circle) {
                related.is_group_shared = true;
                related.recipients.insert(raw_id.to_string());
            }
        }

        related
    }
}

#[async_trait]
impl ResourceProvider for CalendarProvider {
    fn provider_id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>> {
        let calendar_id = item_id.parse::<i64>().unwrap_or(0);
        if calendar_id < 1 {
            return Ok(Vec::new());
        }

        let shares = self.shares.calendars_by_item(calendar_id).await?;
        let mut recipients = Vec::new();
        for share in &shares {
            let Some((kind, raw_id)) = parse_principal(&share.share_principal) else {
                debug!(calendar_id, principal = %share.share_principal,
                    "Skipping share with unknown principal form");
                continue;
            };
            match self.identity.federated_user(raw_id, kind).await {
                Ok(entity) => recipients.push(entity),
                Err(e) => {
                    debug!(calendar_id, principal = %share.share_principal, error = %e,
                        "Skipping unresolvable calendar recipient");
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
        let mut related = Vec::with_capacity(shares.len());
        for share in &shares {
            related.push(self.convert(share).await);
        }
        Ok(related)
    }

    async fn items_available_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<String>> {
        let shares = self.rows_for_entity(entity).await?;
        let mut ids: Vec<String> = shares
            .iter()
            .map(|share| share.calendar_id.to_string())
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
    use crate::clients::shares::MockCalendarShareQuery;

    fn calendar_row(calendar_id: i64, share_principal: &str) -> CalendarShareRow {
        CalendarShareRow {
            calendar_id,
            calendar_name: "Team Calendar".to_string(),
            calendar_principal: "principals/users/carol".to_string(),
            share_principal: share_principal.to_string(),
            event_date: 1_700_000_000,
            event_summary: "quarterly review".to_string(),
        }
    }

    #[test]
    fn test_principal_parsing() {
        assert_eq!(
            parse_principal("principals/users/alice"),
            Some((IdentityKind::User, "alice"))
        );
        assert_eq!(
            parse_principal("principals/groups/staff"),
            Some((IdentityKind::Group, "staff"))
        );
        assert_eq!(parse_principal("principals/rooms/101"), None);
        assert_eq!(parse_principal("principals/users/"), None);
        assert_eq!(parse_principal("bogus"), None);
    }

    #[tokio::test]
    async fn test_user_entities_yield_nothing() {
        let shares = MockCalendarShareQuery::new();
        let identity = MockIdentityClient::new();
        let provider = CalendarProvider::new(Arc::new(shares), Arc::new(identity), "https://cloud");

        let related = provider
            .related_to_entity(&FederatedIdentity::user("s-alice", "alice"))
            .await
            .unwrap();

        assert!(related.is_empty());
    }

    #[tokio::test]
    async fn test_conversion_applies_base_quality() {
        let mut shares = MockCalendarShareQuery::new();
        shares
            .expect_calendars_to_group()
            .returning(|_| Ok(vec![calendar_row(3, "principals/groups/staff")]));
        let mut identity = MockIdentityClient::new();
        identity
            .expect_federated_user()
            .withf(|raw_id, kind| raw_id == "carol" && *kind == IdentityKind::User)
            .returning(|raw_id, kind| Ok(FederatedIdentity {
                single_id: format!("s-{raw_id}"),
                user_id: raw_id.to_string(),
                kind,
                display_name: String::new(),
            }));
        let provider = CalendarProvider::new(Arc::new(shares), Arc::new(identity), "https://cloud");

        let related = provider
            .related_to_entity(&FederatedIdentity::group("s-staff", "staff"))
            .await
            .unwrap();

        let entry = &related[0];
        assert!((entry.score - 0.6).abs() < 1e-9);
        assert_eq!(entry.improvements[0].kind, "calendar_result");
        assert_eq!(entry.link_creator(), "s-carol");
        assert_eq!(
            entry.keywords(),
            ["team", "calendar", "quarterly", "review"]
        );
        assert!(entry.is_group_shared);
    }
}
