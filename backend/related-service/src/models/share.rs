//! Row shapes returned by the shares service.
//!
//! Each provider family has its own row; recipient kinds arrive as raw
//! strings and are parsed per record so one malformed row never poisons
//! a whole result page.

use serde::Deserialize;

/// A file share row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesShareRow {
    pub file_id: i64,
    #[serde(default)]
    pub file_target: String,
    #[serde(default)]
    pub file_owner: String,
    #[serde(default)]
    pub file_last_update: i64,
    #[serde(default)]
    pub share_time: i64,
    #[serde(default)]
    pub share_creator: String,
    #[serde(default)]
    pub shared_with: String,
    #[serde(default)]
    pub share_kind: String,
}

/// A deck board membership row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckShareRow {
    pub board_id: i64,
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub participant: String,
    #[serde(default)]
    pub share_kind: String,
    #[serde(default)]
    pub last_modified: i64,
}

/// A calendar sharing row; principals are DAV uris.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarShareRow {
    pub calendar_id: i64,
    #[serde(default)]
    pub calendar_name: String,
    #[serde(default)]
    pub calendar_principal: String,
    #[serde(default)]
    pub share_principal: String,
    #[serde(default)]
    pub event_date: i64,
    #[serde(default)]
    pub event_summary: String,
}

/// A talk room attendee row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkRoomRow {
    pub room_id: i64,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub actor_id: String,
    #[serde(default)]
    pub actor_kind: String,
}
