//! Boosts candidates whose display-name tokens overlap the home item's.
//! Only the first reference matters here; keywords describe the item
//! itself, not the individual share links.

use super::WeightCalculator;
use crate::models::RelatedResource;

/// Tokens this short ("v2", "the", file extensions) match too easily.
const MIN_TOKEN_LEN: usize = 4;

pub struct KeywordWeight;

impl WeightCalculator for KeywordWeight {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn weight(&self, references: &[RelatedResource], candidates: &mut [RelatedResource]) {
        let Some(home) = references.first() else {
            return;
        };
        let home_keywords = home.keywords();
        if home_keywords.is_empty() {
            return;
        }

        for entry in candidates.iter_mut() {
            let matches = entry
                .keywords()
                .iter()
                .filter(|token| {
                    token.len() >= MIN_TOKEN_LEN && home_keywords.iter().any(|home| home == *token)
                })
                .count();
            for _ in 0..matches {
                entry.improve(RelatedResource::IMPROVE_HIGH_LINK, "keywords", true);
            }
        }
    }
}
