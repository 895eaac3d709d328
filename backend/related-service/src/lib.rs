pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod services;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};

// Re-export the ranking engine components
pub use cache::{CacheStore, MemoryStore, RedisStore, RelatedCache};
pub use models::{FederatedIdentity, IdentityKind, RelatedResource, RelatedResourceView};
pub use providers::{ProviderRegistry, ResourceProvider};
pub use services::RelatedService;
