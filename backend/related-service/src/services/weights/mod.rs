//! Scoring rules applied to the candidate list after access filtering.
//!
//! Each calculator is a stateless pure function over the reference
//! records and the candidate list; it mutates candidate scores in place
//! and must not assume any other calculator already ran.

pub mod age_decay;
pub mod keyword;
pub mod time_proximity;

pub use age_decay::AgeDecayWeight;
pub use keyword::KeywordWeight;
pub use time_proximity::TimeProximityWeight;

use crate::models::RelatedResource;
use std::sync::Arc;

pub trait WeightCalculator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adjust candidate scores in place against the reference records.
    fn weight(&self, references: &[RelatedResource], candidates: &mut [RelatedResource]);
}

/// The rules every deployment runs, in registration order.
pub fn builtin_calculators() -> Vec<Arc<dyn WeightCalculator>> {
    vec![
        Arc::new(TimeProximityWeight),
        Arc::new(KeywordWeight),
        Arc::new(AgeDecayWeight),
    ]
}
