pub mod identity;
pub mod related_resource;
pub mod share;

pub use identity::{FederatedIdentity, IdentityKind};
pub use related_resource::{Improvement, MetaValue, RelatedResource, RelatedResourceView};
pub use share::{CalendarShareRow, DeckShareRow, FilesShareRow, TalkRoomRow};
