//! End-to-end ranking flows over in-memory fakes: a scripted share
//! graph, a scripted membership graph and the real engine on top.

use async_trait::async_trait;
use chrono::Utc;
use related_service::cache::{MemoryStore, RelatedCache};
use related_service::clients::{IdentityClient, LinkError};
use related_service::error::{ServiceError, ServiceResult};
use related_service::models::{FederatedIdentity, IdentityKind, RelatedResource};
use related_service::providers::{ProviderRegistry, ResourceProvider};
use related_service::services::{ProviderLookup, RelatedService};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Membership graph fake: an identity is linked to itself and to every
/// pair scripted through `linked`.
#[derive(Default)]
struct GraphIdentity {
    links: HashSet<(String, String)>,
    hard_fail: bool,
}

impl GraphIdentity {
    fn linked(mut self, single_id: &str, viewer_single_id: &str) -> Self {
        self.links
            .insert((single_id.to_string(), viewer_single_id.to_string()));
        self
    }

    fn failing() -> Self {
        Self {
            links: HashSet::new(),
            hard_fail: true,
        }
    }
}

#[async_trait]
impl IdentityClient for GraphIdentity {
    async fn federated_user(
        &self,
        raw_id: &str,
        kind: IdentityKind,
    ) -> ServiceResult<FederatedIdentity> {
        Ok(FederatedIdentity {
            single_id: format!("s-{raw_id}"),
            user_id: raw_id.to_string(),
            kind,
            display_name: String::new(),
        })
    }

    async fn link(&self, single_id: &str, viewer_single_id: &str) -> Result<(), LinkError> {
        if self.hard_fail {
            return Err(LinkError::Lookup("identity backend down".to_string()));
        }
        if single_id == viewer_single_id
            || self
                .links
                .contains(&(single_id.to_string(), viewer_single_id.to_string()))
        {
            Ok(())
        } else {
            Err(LinkError::NotFound)
        }
    }
}

struct ScriptedProvider {
    id: &'static str,
    recipients: HashMap<String, Vec<FederatedIdentity>>,
    related: HashMap<String, Vec<RelatedResource>>,
}

impl ScriptedProvider {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            recipients: HashMap::new(),
            related: HashMap::new(),
        }
    }

    fn shared_with(mut self, item_id: &str, recipients: Vec<FederatedIdentity>) -> Self {
        self.recipients.insert(item_id.to_string(), recipients);
        self
    }

    fn relates(mut self, single_id: &str, related: Vec<RelatedResource>) -> Self {
        self.related.insert(single_id.to_string(), related);
        self
    }
}

#[async_trait]
impl ResourceProvider for ScriptedProvider {
    fn provider_id(&self) -> &'static str {
        self.id
    }

    async fn shares_recipients(&self, item_id: &str) -> ServiceResult<Vec<FederatedIdentity>> {
        Ok(self.recipients.get(item_id).cloned().unwrap_or_default())
    }

    async fn related_to_entity(
        &self,
        entity: &FederatedIdentity,
    ) -> ServiceResult<Vec<RelatedResource>> {
        Ok(self
            .related
            .get(&entity.single_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn items_available_to_entity(
        &self,
        _: &FederatedIdentity,
    ) -> ServiceResult<Vec<String>> {
        Ok(Vec::new())
    }
}

fn user(name: &str) -> FederatedIdentity {
    FederatedIdentity::user(format!("s-{name}"), name)
}

/// A file candidate with its share-link facts populated.
fn shared_file(item_id: &str, creator: &str, creation: i64, owner: &str) -> RelatedResource {
    let mut record = RelatedResource::new("files", item_id);
    record.title = format!("file-{item_id}");
    record.set_meta(RelatedResource::LINK_CREATOR, creator);
    record.set_meta(RelatedResource::LINK_CREATION, creation);
    record.set_meta(RelatedResource::ITEM_OWNER, owner);
    record
}

fn engine(providers: Vec<ScriptedProvider>, identity: GraphIdentity) -> RelatedService {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::new(provider)).unwrap();
    }
    let lookup = ProviderLookup::new(
        RelatedCache::new(Arc::new(MemoryStore::new()), 600, 600),
        Arc::new(registry),
    );
    RelatedService::new(lookup, Arc::new(identity), Duration::from_millis(200))
}

#[tokio::test]
async fn same_person_sharing_minutes_apart_boosts_the_candidate() {
    let shared_at = Utc::now().timestamp() - 3600;

    // bob shared files 42 and 99 with alice, 60 seconds apart
    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![user("alice")])
        .shared_with("99", vec![user("alice")])
        .relates(
            "s-alice",
            vec![
                shared_file("42", "s-bob", shared_at, "bob"),
                shared_file("99", "s-bob", shared_at + 60, "bob"),
            ],
        );

    let service = engine(vec![files], GraphIdentity::default());
    let result = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    let entry = &result[0];
    assert_eq!(entry.item_id, "99");
    assert!(entry.score > 1.0);
    assert!(entry
        .improvements
        .iter()
        .any(|improvement| improvement.kind == "time_delay_1"));
    // the home item never appears in its own results
    assert!(!result.iter().any(|entry| entry.item_id == "42"));
}

#[tokio::test]
async fn repeated_sightings_collapse_into_one_boosted_record() {
    let alice = user("alice");
    let bob = user("bob");

    // files:7 reaches alice twice and bob once, through three links
    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![alice.clone(), bob.clone()])
        .shared_with("7", vec![alice.clone(), bob.clone()])
        .relates(
            "s-alice",
            vec![
                shared_file("7", "s-carol", 0, "carol"),
                shared_file("7", "s-dave", 0, "carol"),
            ],
        )
        .relates("s-bob", vec![shared_file("7", "s-carol", 0, "carol")]);

    let service = engine(vec![files], GraphIdentity::default());
    let result = service
        .related_to_item(&alice, "files", "42", -1, None)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    let entry = &result[0];
    let occurrences: Vec<f64> = entry
        .improvements
        .iter()
        .filter(|improvement| improvement.kind == "occurrence")
        .map(|improvement| improvement.quality)
        .collect();
    // second sighting applies 1.3, third the diminished 1.21
    assert_eq!(occurrences.len(), 2);
    assert!((occurrences[0] - 1.3).abs() < 1e-9);
    assert!((occurrences[1] - 1.21).abs() < 1e-9);
    assert!((entry.score - 1.3 * 1.21).abs() < 1e-9);
}

#[tokio::test]
async fn output_is_sorted_truncated_and_deterministic() {
    let shared_at = Utc::now().timestamp() - 7200;

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![user("alice")])
        .shared_with("99", vec![user("alice")])
        .shared_with("80", vec![user("alice")])
        .shared_with("70", vec![user("alice")])
        .relates(
            "s-alice",
            vec![
                shared_file("42", "s-bob", shared_at, "bob"),
                shared_file("70", "s-bob", shared_at + 5000, "bob"),
                shared_file("80", "s-bob", shared_at + 600, "bob"),
                shared_file("99", "s-bob", shared_at + 60, "bob"),
            ],
        );

    let service = engine(vec![files], GraphIdentity::default());

    let full = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();
    let ids: Vec<&str> = full.iter().map(|entry| entry.item_id.as_str()).collect();
    assert_eq!(ids, ["99", "80", "70"]);
    for pair in full.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let page = service
        .related_to_item(&user("alice"), "files", "42", 2, None)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].item_id, "99");
    assert_eq!(page[1].item_id, "80");

    let empty = service
        .related_to_item(&user("alice"), "files", "42", 0, None)
        .await
        .unwrap();
    assert!(empty.is_empty());

    // repeated runs keep the order
    let again = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();
    let again_ids: Vec<&str> = again.iter().map(|entry| entry.item_id.as_str()).collect();
    assert_eq!(again_ids, ids);
}

#[tokio::test]
async fn warm_cache_changes_nothing_about_the_result() {
    let shared_at = Utc::now().timestamp() - 7200;

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![user("alice")])
        .shared_with("99", vec![user("alice")])
        .shared_with("80", vec![user("alice")])
        .relates(
            "s-alice",
            vec![
                shared_file("42", "s-bob", shared_at, "bob"),
                shared_file("99", "s-bob", shared_at + 60, "bob"),
                shared_file("80", "s-bob", shared_at + 600, "bob"),
            ],
        );

    let service = engine(vec![files], GraphIdentity::default());

    let cold = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();
    let warm = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();

    let project = |result: &[RelatedResource]| -> Vec<(String, String, f64)> {
        result
            .iter()
            .map(|entry| (entry.provider_id.clone(), entry.item_id.clone(), entry.score))
            .collect()
    };
    assert_eq!(project(&cold), project(&warm));
}

#[tokio::test]
async fn no_result_set_ever_repeats_a_provider_item_pair() {
    let alice = user("alice");
    let bob = user("bob");

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![alice.clone(), bob.clone()])
        .shared_with("7", vec![alice.clone(), bob.clone()])
        .shared_with("9", vec![alice.clone()])
        .relates(
            "s-alice",
            vec![
                shared_file("7", "s-carol", 0, "carol"),
                shared_file("9", "s-carol", 0, "carol"),
            ],
        )
        .relates("s-bob", vec![shared_file("7", "s-carol", 0, "carol")]);
    let deck = ScriptedProvider::new("deck")
        .relates("s-alice", vec![RelatedResource::new("deck", "7")])
        .relates("s-bob", vec![RelatedResource::new("deck", "7")]);

    let service = engine(vec![files, deck], GraphIdentity::default());
    let result = service
        .related_to_item(&alice, "files", "42", -1, None)
        .await
        .unwrap();

    let mut seen = HashSet::new();
    for entry in &result {
        assert!(
            seen.insert((entry.provider_id.clone(), entry.item_id.clone())),
            "duplicate pair {}:{}",
            entry.provider_id,
            entry.item_id
        );
    }
    assert_eq!(result.len(), 3);
}

#[tokio::test]
async fn unverifiable_candidates_are_dropped_and_owners_kept() {
    let carol = user("carol");
    let staff = FederatedIdentity::group("s-staff", "staff");

    // both candidates were discovered through the staff group, but the
    // membership graph has no link from carol to staff
    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![staff.clone()])
        .shared_with("7", vec![staff.clone()])
        .shared_with("8", vec![staff.clone()])
        .relates(
            "s-staff",
            vec![
                shared_file("7", "s-dave", 0, "dave"),
                shared_file("8", "s-dave", 0, "carol"),
            ],
        );

    let service = engine(vec![files], GraphIdentity::default());
    let result = service
        .related_to_item(&carol, "files", "42", -1, None)
        .await
        .unwrap();

    // only the item carol owns survives the failed reachability check
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].item_id, "8");
}

#[tokio::test]
async fn group_members_reach_group_discovered_items() {
    let carol = user("carol");
    let staff = FederatedIdentity::group("s-staff", "staff");

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![staff.clone()])
        .shared_with("7", vec![staff.clone()])
        .relates("s-staff", vec![shared_file("7", "s-dave", 0, "dave")]);

    let identity = GraphIdentity::default().linked("s-staff", "s-carol");
    let service = engine(vec![files], identity);
    let result = service
        .related_to_item(&carol, "files", "42", -1, None)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].item_id, "7");
}

#[tokio::test]
async fn broken_membership_backend_fails_closed() {
    let carol = user("carol");
    let staff = FederatedIdentity::group("s-staff", "staff");

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![staff.clone()])
        .shared_with("8", vec![staff.clone()])
        .relates("s-staff", vec![shared_file("8", "s-dave", 0, "carol")]);

    let service = engine(vec![files], GraphIdentity::failing());
    let result = service
        .related_to_item(&carol, "files", "42", -1, None)
        .await
        .unwrap();

    // a hard lookup failure drops the record, owner or not
    assert!(result.is_empty());
}

#[tokio::test]
async fn membership_lag_falls_back_to_the_authoritative_recipient_list() {
    let alice = user("alice");
    let staff = FederatedIdentity::group("s-staff", "staff");

    // no membership link scripted, but alice appears literally among
    // the candidate's own recipients
    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![staff.clone()])
        .shared_with("7", vec![staff.clone(), alice.clone()])
        .relates("s-staff", vec![shared_file("7", "s-dave", 0, "dave")]);

    let service = engine(vec![files], GraphIdentity::default());
    let result = service
        .related_to_item(&alice, "files", "42", -1, None)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].item_id, "7");
}

#[tokio::test]
async fn missing_provider_rejects_its_items_but_not_others() {
    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![user("alice")])
        .shared_with("7", vec![user("alice")])
        .relates("s-alice", vec![shared_file("7", "s-bob", 0, "bob")]);

    let service = engine(vec![files], GraphIdentity::default());

    let err = service
        .related_to_item(&user("alice"), "deck", "5", -1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProviderNotFound(_)));

    let result = service
        .related_to_item(&user("alice"), "files", "42", -1, None)
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert!(result.iter().all(|entry| entry.provider_id == "files"));
}

#[tokio::test]
async fn flushing_the_cache_surfaces_new_shares() {
    let alice = user("alice");

    let files = ScriptedProvider::new("files")
        .shared_with("42", vec![alice.clone()])
        .shared_with("7", vec![alice.clone()])
        .relates("s-alice", vec![shared_file("7", "s-bob", 0, "bob")]);

    let service = engine(vec![files], GraphIdentity::default());

    let before = service
        .related_to_item(&alice, "files", "42", -1, None)
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    // the scripted graph cannot change mid-test, but the flush path
    // itself must clear both families without error
    service.flush_cache().await.unwrap();

    let after = service
        .related_to_item(&alice, "files", "42", -1, None)
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
}
