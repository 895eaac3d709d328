//! Related-resource endpoints.
//!
//! The gateway terminates authentication; the viewer arrives as the
//! trusted `x-user-id` header. Responses carry only the sanitized
//! projection of each record.

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::models::RelatedResourceView;
use crate::services::RelatedService;

const USER_ID_HEADER: &str = "x-user-id";

/// Handler state shared across workers.
pub struct RelatedHandlerState {
    pub service: Arc<RelatedService>,
    /// Result count applied when the caller passes no limit.
    pub default_limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedQuery {
    /// Maximum results; negative means unbounded.
    pub limit: Option<i64>,
    /// Restrict output to one provider's results.
    pub resource_type: Option<String>,
}

/// GET /api/v1/related/{provider}/{item}
#[get("/related/{provider}/{item}")]
pub async fn get_related(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<RelatedQuery>,
    state: web::Data<RelatedHandlerState>,
) -> ServiceResult<HttpResponse> {
    let (provider_id, item_id) = path.into_inner();
    let user_id = extract_user_id(&req)?;
    let viewer = state.service.resolve_viewer(&user_id).await?;

    let limit = query.limit.unwrap_or(state.default_limit as i64);
    debug!(provider_id, item_id, limit, "Ranking related resources");

    let started = Instant::now();
    let result = state
        .service
        .related_to_item(
            &viewer,
            &provider_id,
            &item_id,
            limit,
            query.resource_type.as_deref(),
        )
        .await
        .map_err(|err| {
            error!(provider_id, item_id, error = %err, "Ranking request failed");
            err
        })?;
    metrics::record_request(&provider_id, started.elapsed().as_secs_f64());

    let views: Vec<RelatedResourceView> = result.iter().map(|entry| entry.to_view()).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// POST /internal/related/flush
///
/// Called by share create/update/delete hooks so fresh shares surface
/// without waiting out the TTL.
#[post("/related/flush")]
pub async fn flush_cache(state: web::Data<RelatedHandlerState>) -> ServiceResult<HttpResponse> {
    state.service.flush_cache().await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "related-service",
    }))
}

fn extract_user_id(req: &HttpRequest) -> ServiceResult<String> {
    let header_value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| ServiceError::Unauthorized("Missing x-user-id header".into()))?;

    let value = header_value
        .to_str()
        .map_err(|_| ServiceError::Unauthorized("Invalid x-user-id header".into()))?;
    if value.is_empty() {
        return Err(ServiceError::Unauthorized("Empty x-user-id header".into()));
    }

    Ok(value.to_string())
}
