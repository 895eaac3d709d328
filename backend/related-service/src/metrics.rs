use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

static RELATED_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "related_service_requests_total",
            "Total ranking requests handled by related-service",
        ),
        &["provider"],
    )
    .expect("failed to create related_service_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register related_service_requests_total");
    counter
});

static RELATED_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "related_service_request_duration_seconds",
            "Ranking request latency for related-service",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["provider"],
    )
    .expect("failed to create related_service_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register related_service_request_duration_seconds");
    histogram
});

static CACHE_HITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "related_service_cache_hits_total",
            "Cache hits by key family",
        ),
        &["family"],
    )
    .expect("failed to create related_service_cache_hits_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register related_service_cache_hits_total");
    counter
});

static CACHE_MISSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "related_service_cache_misses_total",
            "Cache misses by key family, malformed entries included",
        ),
        &["family"],
    )
    .expect("failed to create related_service_cache_misses_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register related_service_cache_misses_total");
    counter
});

static PROVIDER_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "related_service_provider_failures_total",
            "Provider fetches skipped after an error or timeout",
        ),
        &["provider"],
    )
    .expect("failed to create related_service_provider_failures_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register related_service_provider_failures_total");
    counter
});

static CANDIDATES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "related_service_candidates_dropped_total",
            "Candidates removed by the access filter",
        ),
        &["reason"],
    )
    .expect("failed to create related_service_candidates_dropped_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register related_service_candidates_dropped_total");
    counter
});

pub fn record_request(provider: &str, elapsed_secs: f64) {
    RELATED_REQUESTS_TOTAL.with_label_values(&[provider]).inc();
    RELATED_REQUEST_DURATION_SECONDS
        .with_label_values(&[provider])
        .observe(elapsed_secs);
}

pub fn record_cache_hit(family: &str) {
    CACHE_HITS_TOTAL.with_label_values(&[family]).inc();
}

pub fn record_cache_miss(family: &str) {
    CACHE_MISSES_TOTAL.with_label_values(&[family]).inc();
}

pub fn record_provider_failure(provider: &str) {
    PROVIDER_FAILURES_TOTAL.with_label_values(&[provider]).inc();
}

pub fn record_dropped_candidate(reason: &str) {
    CANDIDATES_DROPPED_TOTAL.with_label_values(&[reason]).inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_register_once() {
        record_cache_hit("shares");
        record_cache_hit("shares");
        record_cache_miss("relatedToEntity");
        record_provider_failure("files");
        record_dropped_candidate("no_recipient");
        record_request("files", 0.02);

        assert!(CACHE_HITS_TOTAL.with_label_values(&["shares"]).get() >= 2);
    }
}
