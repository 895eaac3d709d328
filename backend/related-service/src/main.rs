use actix_web::{middleware, web, App, HttpServer};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use related_service::cache::{RedisStore, RelatedCache};
use related_service::clients::{HttpIdentityClient, HttpShareClient};
use related_service::handlers::{flush_cache, get_related, health, RelatedHandlerState};
use related_service::metrics;
use related_service::providers::{
    CalendarProvider, DeckProvider, FilesProvider, ProviderRegistry, TalkProvider,
};
use related_service::services::{ProviderLookup, RelatedService};
use related_service::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting related-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let redis_client = redis::Client::open(config.cache.redis_url.clone())?;
    let redis = ConnectionManager::new(redis_client).await?;
    tracing::info!("Connected to Redis");

    let cache = RelatedCache::new(
        Arc::new(RedisStore::new(redis, "related")),
        config.cache.recipient_ttl_secs,
        config.cache.related_ttl_secs,
    );

    let timeout = Duration::from_millis(config.upstream.timeout_ms);
    let identity = Arc::new(HttpIdentityClient::new(
        &config.upstream.identity_base_url,
        timeout,
    )?);
    let shares = Arc::new(HttpShareClient::new(
        &config.upstream.shares_base_url,
        timeout,
    )?);
    let frontend = config.upstream.frontend_base_url.clone();

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(FilesProvider::new(
        shares.clone(),
        identity.clone(),
        frontend.clone(),
    )))?;
    if config.providers.deck_enabled {
        registry.register(Arc::new(DeckProvider::new(
            shares.clone(),
            identity.clone(),
            frontend.clone(),
        )))?;
    }
    if config.providers.calendar_enabled {
        registry.register(Arc::new(CalendarProvider::new(
            shares.clone(),
            identity.clone(),
            frontend.clone(),
        )))?;
    }
    if config.providers.talk_enabled {
        registry.register(Arc::new(TalkProvider::new(
            shares.clone(),
            identity.clone(),
            frontend,
        )))?;
    }
    tracing::info!(providers = registry.len(), "Provider registry assembled");

    let lookup = ProviderLookup::new(cache, Arc::new(registry));
    let service = Arc::new(RelatedService::new(lookup, identity, timeout));
    let state = web::Data::new(RelatedHandlerState {
        service,
        default_limit: config.ranking.result_max,
    });

    let addr = format!("{}:{}", config.app.host, config.app.http_port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .service(health)
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(web::scope("/api/v1").service(get_related))
            .service(web::scope("/internal").service(flush_cache))
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
