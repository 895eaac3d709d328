//! Merge step of a ranking pass.
//!
//! Candidates arrive per (provider, recipient) fetch and are folded
//! into one set: duplicates collapse onto the first-seen record with an
//! occurrence boost, and sightings of the home item itself are kept
//! aside as reference records instead of output.

use crate::models::{FederatedIdentity, RelatedResource};
use std::collections::HashMap;

/// What happened to an absorbed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// First sighting, stored at this index.
    New(usize),
    /// Already known; the stored record took an occurrence boost.
    Duplicate,
    /// The home item itself, kept as a reference for the calculators.
    Reference,
}

pub struct CandidateSet {
    home_provider: String,
    home_item: String,
    items: Vec<RelatedResource>,
    known: HashMap<(String, String), usize>,
    references: Vec<RelatedResource>,
}

impl CandidateSet {
    pub fn new(home_provider: &str, home_item: &str) -> Self {
        Self {
            home_provider: home_provider.to_string(),
            home_item: home_item.to_string(),
            items: Vec::new(),
            known: HashMap::new(),
            references: Vec::new(),
        }
    }

    /// Fold one candidate sighted through `recipient` into the set.
    pub fn absorb(
        &mut self,
        mut candidate: RelatedResource,
        recipient: &FederatedIdentity,
    ) -> AddOutcome {
        candidate.set_meta(
            RelatedResource::LINK_RECIPIENT,
            recipient.single_id.as_str(),
        );

        // every sighting of the home item is a path back to the query
        if candidate.provider_id == self.home_provider && candidate.item_id == self.home_item {
            self.references.push(candidate);
            return AddOutcome::Reference;
        }

        let pair = (candidate.provider_id.clone(), candidate.item_id.clone());
        if let Some(&index) = self.known.get(&pair) {
            let stored = &mut self.items[index];
            stored.improve(RelatedResource::IMPROVE_OCCURRENCE, "occurrence", true);
            stored.merge_virtual_group(&candidate);
            return AddOutcome::Duplicate;
        }

        let index = self.items.len();
        self.items.push(candidate);
        self.known.insert(pair, index);
        AddOutcome::New(index)
    }

    pub fn candidate_mut(&mut self, index: usize) -> &mut RelatedResource {
        &mut self.items[index]
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    pub fn into_parts(self) -> (Vec<RelatedResource>, Vec<RelatedResource>) {
        (self.items, self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> FederatedIdentity {
        FederatedIdentity::user("s-alice", "alice")
    }

    fn bob() -> FederatedIdentity {
        FederatedIdentity::user("s-bob", "bob")
    }

    #[test]
    fn test_home_item_becomes_reference_not_output() {
        let mut set = CandidateSet::new("files", "42");

        let outcome = set.absorb(RelatedResource::new("files", "42"), &alice());
        assert_eq!(outcome, AddOutcome::Reference);

        let (items, references) = set.into_parts();
        assert!(items.is_empty());
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].link_recipient(), "s-alice");
    }

    #[test]
    fn test_every_home_sighting_is_collected() {
        let mut set = CandidateSet::new("files", "42");
        set.absorb(RelatedResource::new("files", "42"), &alice());
        set.absorb(RelatedResource::new("files", "42"), &bob());

        assert!(set.has_references());
        let (_, references) = set.into_parts();
        assert_eq!(references.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse_with_occurrence_boost() {
        let mut set = CandidateSet::new("files", "42");

        assert_eq!(
            set.absorb(RelatedResource::new("files", "7"), &alice()),
            AddOutcome::New(0)
        );
        assert_eq!(
            set.absorb(RelatedResource::new("files", "7"), &bob()),
            AddOutcome::Duplicate
        );
        assert_eq!(
            set.absorb(RelatedResource::new("files", "7"), &bob()),
            AddOutcome::Duplicate
        );

        let (items, _) = set.into_parts();
        assert_eq!(items.len(), 1);
        let entry = &items[0];
        // second sighting applies 1.3, third the diminished 1.21
        assert_eq!(entry.improvements.len(), 2);
        assert!((entry.improvements[0].quality - 1.3).abs() < 1e-9);
        assert!((entry.improvements[1].quality - 1.21).abs() < 1e-9);
        assert!((entry.score - 1.3 * 1.21).abs() < 1e-9);
        // the first recipient to surface the item keeps the link
        assert_eq!(entry.link_recipient(), "s-alice");
    }

    #[test]
    fn test_duplicate_merges_sharing_context() {
        let mut set = CandidateSet::new("files", "42");

        let mut first = RelatedResource::new("deck", "5");
        first.virtual_group.insert("alice".to_string());
        set.absorb(first, &alice());

        let mut second = RelatedResource::new("deck", "5");
        second.virtual_group.insert("staff".to_string());
        second.is_group_shared = true;
        set.absorb(second, &bob());

        let (items, _) = set.into_parts();
        assert!(items[0].virtual_group.contains("alice"));
        assert!(items[0].virtual_group.contains("staff"));
        assert!(items[0].is_group_shared);
    }

    #[test]
    fn test_same_item_id_under_other_provider_stays_distinct() {
        let mut set = CandidateSet::new("files", "42");

        assert_eq!(
            set.absorb(RelatedResource::new("files", "7"), &alice()),
            AddOutcome::New(0)
        );
        assert_eq!(
            set.absorb(RelatedResource::new("deck", "7"), &alice()),
            AddOutcome::New(1)
        );

        let (items, _) = set.into_parts();
        assert_eq!(items.len(), 2);
    }
}
