//! Candidate record produced during aggregation and returned, ranked,
//! to the caller.
//!
//! Scoring is multiplicative: every record starts at 1.0 and weight
//! rules adjust it through [`RelatedResource::improve`]. Each applied
//! improvement is kept in an append-only log for auditability, and the
//! per-type quality bookkeeping makes repeated boosts of the same type
//! idempotent instead of compounding.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A provider-specific fact attached to a candidate, consumed by the
/// weight calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Number(i64),
    List(Vec<String>),
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        MetaValue::List(value)
    }
}

/// One applied score adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(rename = "type")]
    pub kind: String,
    pub quality: f64,
}

fn default_score() -> f64 {
    1.0
}

/// A candidate / result record.
///
/// `provider_id` + `item_id` uniquely identify a real-world object; the
/// aggregation engine guarantees no two records with the same pair ever
/// coexist in a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedResource {
    pub provider_id: String,
    pub item_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default)]
    pub improvements: Vec<Improvement>,
    #[serde(default)]
    pub current_quality: HashMap<String, f64>,
    /// Identities jointly owning the share relationship; detects 1:1 shares.
    #[serde(default)]
    pub virtual_group: BTreeSet<String>,
    /// Identities the item is shared to when shared as a group/circle.
    #[serde(default)]
    pub recipients: BTreeSet<String>,
    #[serde(default)]
    pub is_group_shared: bool,
    #[serde(default)]
    pub meta: HashMap<String, MetaValue>,
}

impl RelatedResource {
    pub const IMPROVE_LOW_LINK: f64 = 1.1;
    pub const IMPROVE_MEDIUM_LINK: f64 = 1.3;
    pub const IMPROVE_HIGH_LINK: f64 = 1.8;
    pub const IMPROVE_OCCURRENCE: f64 = 1.3;
    pub const UNRELATED: f64 = 0.85;
    const DIMINISHING_RETURN: f64 = 0.7;

    pub const ITEM_OWNER: &'static str = "itemOwner";
    pub const ITEM_CREATION: &'static str = "itemCreation";
    pub const ITEM_LAST_UPDATE: &'static str = "itemLastUpdate";
    pub const ITEM_KEYWORDS: &'static str = "itemKeywords";
    pub const LINK_CREATOR: &'static str = "linkCreator";
    pub const LINK_CREATION: &'static str = "linkCreation";
    pub const LINK_RECIPIENT: &'static str = "linkRecipient";

    pub fn new(provider_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            item_id: item_id.into(),
            title: String::new(),
            subtitle: String::new(),
            tooltip: String::new(),
            icon_url: String::new(),
            preview_url: String::new(),
            url: String::new(),
            score: 1.0,
            improvements: Vec::new(),
            current_quality: HashMap::new(),
            virtual_group: BTreeSet::new(),
            recipients: BTreeSet::new(),
            is_group_shared: false,
            meta: HashMap::new(),
        }
    }

    /// Apply a named multiplicative score adjustment.
    ///
    /// The first application of a type multiplies the score by the full
    /// `quality`. Every later application of the same type re-applies the
    /// quality stored for that type instead of the fresh value; with
    /// `diminishing_return` the stored value shrinks towards 1.0 after
    /// each application, so repeated boosts cannot compound unboundedly.
    pub fn improve(&mut self, quality: f64, kind: &str, diminishing_return: bool) {
        let applied = self.current_quality.get(kind).copied().unwrap_or(quality);
        self.score *= applied;
        self.improvements.push(Improvement {
            kind: kind.to_string(),
            quality: applied,
        });

        let stored = if diminishing_return {
            1.0 + (applied - 1.0) * Self::DIMINISHING_RETURN
        } else {
            applied
        };
        self.current_quality.insert(kind.to_string(), stored);
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.meta.insert(key.to_string(), value.into());
    }

    pub fn has_meta(&self, key: &str) -> bool {
        self.meta.contains_key(key)
    }

    /// Text meta value, empty string when absent or of another type.
    pub fn meta_str(&self, key: &str) -> &str {
        match self.meta.get(key) {
            Some(MetaValue::Text(value)) => value,
            _ => "",
        }
    }

    /// Numeric meta value, 0 when absent or of another type.
    pub fn meta_int(&self, key: &str) -> i64 {
        match self.meta.get(key) {
            Some(MetaValue::Number(value)) => *value,
            _ => 0,
        }
    }

    /// List meta value, empty when absent or of another type.
    pub fn meta_list(&self, key: &str) -> &[String] {
        match self.meta.get(key) {
            Some(MetaValue::List(value)) => value,
            _ => &[],
        }
    }

    pub fn link_creation(&self) -> i64 {
        self.meta_int(Self::LINK_CREATION)
    }

    pub fn link_creator(&self) -> &str {
        self.meta_str(Self::LINK_CREATOR)
    }

    pub fn link_recipient(&self) -> &str {
        self.meta_str(Self::LINK_RECIPIENT)
    }

    pub fn item_owner(&self) -> &str {
        self.meta_str(Self::ITEM_OWNER)
    }

    pub fn keywords(&self) -> &[String] {
        self.meta_list(Self::ITEM_KEYWORDS)
    }

    /// Fold the sharing context of a duplicate sighting into this record.
    pub fn merge_virtual_group(&mut self, other: &RelatedResource) {
        self.virtual_group
            .extend(other.virtual_group.iter().cloned());
        self.recipients.extend(other.recipients.iter().cloned());
        self.is_group_shared = self.is_group_shared || other.is_group_shared;
    }

    /// Outward projection carrying only display-safe fields.
    pub fn to_view(&self) -> RelatedResourceView {
        RelatedResourceView {
            provider_id: self.provider_id.clone(),
            item_id: self.item_id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            tooltip: self.tooltip.clone(),
            url: self.url.clone(),
            score: self.score,
            improvements: self.improvements.clone(),
        }
    }
}

/// Sanitized projection returned by the API. Internal meta, quality
/// bookkeeping and raw identity ids never cross this boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedResourceView {
    pub provider_id: String,
    pub item_id: String,
    pub title: String,
    pub subtitle: String,
    pub tooltip: String,
    pub url: String,
    pub score: f64,
    pub improvements: Vec<Improvement>,
}
