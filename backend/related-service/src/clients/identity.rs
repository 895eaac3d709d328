//! Client for the identity service.
//!
//! Resolves raw source-local ids into federated identities and answers
//! membership link checks between two identities.

use crate::error::{ServiceError, ServiceResult};
use crate::models::{FederatedIdentity, IdentityKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Outcome of a membership link lookup.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No membership path exists between the two identities.
    #[error("no link between the identities")]
    NotFound,
    /// The lookup itself failed; membership is unknown.
    #[error("link lookup failed: {0}")]
    Lookup(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Resolve a source-local id into its federated identity.
    async fn federated_user(
        &self,
        raw_id: &str,
        kind: IdentityKind,
    ) -> ServiceResult<FederatedIdentity>;

    /// Check whether `viewer_single_id` is linked to `single_id`, i.e.
    /// is that identity or belongs to it.
    async fn link(&self, single_id: &str, viewer_single_id: &str) -> Result<(), LinkError>;
}

pub struct HttpIdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str, timeout: Duration) -> ServiceResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn federated_user(
        &self,
        raw_id: &str,
        kind: IdentityKind,
    ) -> ServiceResult<FederatedIdentity> {
        let url = format!(
            "{}/api/v1/identity/{}/{}",
            self.base_url,
            kind.as_str(),
            raw_id
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            ServiceError::IdentityResolution(format!("{} {raw_id}: {e}", kind.as_str()))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::IdentityResolution(format!(
                "unknown {} '{raw_id}'",
                kind.as_str()
            )));
        }
        if !response.status().is_success() {
            return Err(ServiceError::IdentityResolution(format!(
                "{} {raw_id}: upstream returned {}",
                kind.as_str(),
                response.status()
            )));
        }

        response.json::<FederatedIdentity>().await.map_err(|e| {
            ServiceError::IdentityResolution(format!("{} {raw_id}: {e}", kind.as_str()))
        })
    }

    async fn link(&self, single_id: &str, viewer_single_id: &str) -> Result<(), LinkError> {
        let url = format!(
            "{}/api/v1/identity/link/{}/{}",
            self.base_url, single_id, viewer_single_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LinkError::Lookup(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(LinkError::NotFound),
            status => Err(LinkError::Lookup(format!("upstream returned {status}"))),
        }
    }
}
