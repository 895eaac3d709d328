//! HTTP clients for the identity and shares services.

pub mod identity;
pub mod shares;

pub use identity::{HttpIdentityClient, IdentityClient, LinkError};
pub use shares::{
    CalendarShareQuery, DeckShareQuery, FilesShareQuery, HttpShareClient, TalkRoomQuery,
};
