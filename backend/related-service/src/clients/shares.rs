//! Client for the shares service.
//!
//! One query trait per provider family so providers depend only on the
//! rows they consume; the HTTP client implements all of them against
//! the same upstream.

use crate::error::ServiceResult;
use crate::models::{CalendarShareRow, DeckShareRow, FilesShareRow, TalkRoomRow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilesShareQuery: Send + Sync {
    async fn shares_by_item(&self, file_id: i64) -> ServiceResult<Vec<FilesShareRow>>;
    async fn shares_to_user(&self, user_id: &str) -> ServiceResult<Vec<FilesShareRow>>;
    async fn shares_to_group(&self, name: &str) -> ServiceResult<Vec<FilesShareRow>>;
    async fn shares_to_circle(&self, single_id: &str) -> ServiceResult<Vec<FilesShareRow>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeckShareQuery: Send + Sync {
    async fn boards_by_item(&self, board_id: i64) -> ServiceResult<Vec<DeckShareRow>>;
    async fn boards_to_user(&self, user_id: &str) -> ServiceResult<Vec<DeckShareRow>>;
    async fn boards_to_group(&self, name: &str) -> ServiceResult<Vec<DeckShareRow>>;
    async fn boards_to_circle(&self, single_id: &str) -> ServiceResult<Vec<DeckShareRow>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarShareQuery: Send + Sync {
    async fn calendars_by_item(&self, calendar_id: i64) -> ServiceResult<Vec<CalendarShareRow>>;
    async fn calendars_to_group(&self, name: &str) -> ServiceResult<Vec<CalendarShareRow>>;
    async fn calendars_to_circle(&self, single_id: &str) -> ServiceResult<Vec<CalendarShareRow>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TalkRoomQuery: Send + Sync {
    async fn rooms_by_item(&self, room_id: i64) -> ServiceResult<Vec<TalkRoomRow>>;
    async fn rooms_to_group(&self, name: &str) -> ServiceResult<Vec<TalkRoomRow>>;
    async fn rooms_to_circle(&self, single_id: &str) -> ServiceResult<Vec<TalkRoomRow>>;
}

pub struct HttpShareClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShareClient {
    pub fn new(base_url: &str, timeout: Duration) -> ServiceResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// An unknown item or entity is an empty result, not a failure.
    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<Vec<T>> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let rows = response.error_for_status()?.json::<Vec<T>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl FilesShareQuery for HttpShareClient {
    async fn shares_by_item(&self, file_id: i64) -> ServiceResult<Vec<FilesShareRow>> {
        self.fetch_rows(&format!("/api/v1/files/shares/item/{file_id}"))
            .await
    }

    async fn shares_to_user(&self, user_id: &str) -> ServiceResult<Vec<FilesShareRow>> {
        self.fetch_rows(&format!("/api/v1/files/shares/user/{user_id}"))
            .await
    }

    async fn shares_to_group(&self, name: &str) -> ServiceResult<Vec<FilesShareRow>> {
        self.fetch_rows(&format!("/api/v1/files/shares/group/{name}"))
            .await
    }

    async fn shares_to_circle(&self, single_id: &str) -> ServiceResult<Vec<FilesShareRow>> {
        self.fetch_rows(&format!("/api/v1/files/shares/circle/{single_id}"))
            .await
    }
}

#[async_trait]
impl DeckShareQuery for HttpShareClient {
    async fn boards_by_item(&self, board_id: i64) -> ServiceResult<Vec<DeckShareRow>> {
        self.fetch_rows(&format!("/api/v1/deck/shares/item/{board_id}"))
            .await
    }

    async fn boards_to_user(&self, user_id: &str) -> ServiceResult<Vec<DeckShareRow>> {
        self.fetch_rows(&format!("/api/v1/deck/shares/user/{user_id}"))
            .await
    }

    async fn boards_to_group(&self, name: &str) -> ServiceResult<Vec<DeckShareRow>> {
        self.fetch_rows(&format!("/api/v1/deck/shares/group/{name}"))
            .await
    }

    async fn boards_to_circle(&self, single_id: &str) -> ServiceResult<Vec<DeckShareRow>> {
        self.fetch_rows(&format!("/api/v1/deck/shares/circle/{single_id}"))
            .await
    }
}

#[async_trait]
impl CalendarShareQuery for HttpShareClient {
    async fn calendars_by_item(&self, calendar_id: i64) -> ServiceResult<Vec<CalendarShareRow>> {
        self.fetch_rows(&format!("/api/v1/calendar/shares/item/{calendar_id}"))
            .await
    }

    async fn calendars_to_group(&self, name: &str) -> ServiceResult<Vec<CalendarShareRow>> {
        self.fetch_rows(&format!("/api/v1/calendar/shares/group/{name}"))
            .await
    }

    async fn calendars_to_circle(&self, single_id: &str) -> ServiceResult<Vec<CalendarShareRow>> {
        self.fetch_rows(&format!("/api/v1/calendar/shares/circle/{single_id}"))
            .await
    }
}

#[async_trait]
impl TalkRoomQuery for HttpShareClient {
    async fn rooms_by_item(&self, room_id: i64) -> ServiceResult<Vec<TalkRoomRow>> {
        self.fetch_rows(&format!("/api/v1/talk/rooms/item/{room_id}"))
            .await
    }

    async fn rooms_to_group(&self, name: &str) -> ServiceResult<Vec<TalkRoomRow>> {
        self.fetch_rows(&format!("/api/v1/talk/rooms/group/{name}"))
            .await
    }

    async fn rooms_to_circle(&self, single_id: &str) -> ServiceResult<Vec<TalkRoomRow>> {
        self.fetch_rows(&format!("/api/v1/talk/rooms/circle/{single_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client =
            HttpShareClient::new("http://shares:8011/", Duration::from_millis(500)).unwrap();
        assert_eq!(client.base_url, "http://shares:8011");
    }

    #[tokio::test]
    async fn test_mock_files_query() {
        let mut mock = MockFilesShareQuery::new();
        mock.expect_shares_by_item()
            .withf(|file_id| *file_id == 42)
            .returning(|_| Ok(Vec::new()));

        assert!(mock.shares_by_item(42).await.unwrap().is_empty());
    }
}
