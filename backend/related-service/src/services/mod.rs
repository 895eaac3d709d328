//! Engine assembly: candidate aggregation, access filtering, weighting
//! and the orchestrator gluing them together.

pub mod access;
pub mod aggregation;
pub mod lookup;
pub mod related;
pub mod weights;

pub use access::AccessFilter;
pub use aggregation::{AddOutcome, CandidateSet};
pub use lookup::ProviderLookup;
pub use related::RelatedService;
pub use weights::WeightCalculator;
