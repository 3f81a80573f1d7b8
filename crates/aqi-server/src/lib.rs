use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use aqi_core::{resolve, AirQualitySource, AqiError, AqiResult, LocationQuery};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use opentelemetry::{
    metrics::{Counter, MeterProvider},
    KeyValue,
};
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

pub mod error;

pub use error::{ApiError, ApiResult};

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    upstream_failures_total: Counter<u64>,
    source: Arc<dyn AirQualitySource>,
}

pub fn build_app(
    source: Arc<dyn AirQualitySource>,
    cors_allow: &[String],
) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter().with_registry(registry.clone()).build()?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("aqi-server");

    let requests_total = meter
        .u64_counter("aqi_requests_total")
        .with_description("Total AQI lookups served")
        .init();
    let upstream_failures_total = meter
        .u64_counter("aqi_upstream_failures_total")
        .with_description("Upstream calls that failed, by kind")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        upstream_failures_total,
        source,
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/aqi/by-city", get(aqi_by_city))
        .route("/api/aqi/by-coords", get(aqi_by_coords))
        .layer(cors_layer(cors_allow))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();
    layer.allow_origin(origins)
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

#[derive(Deserialize)]
struct CityQuery {
    city: Option<String>,
    state: Option<String>,
}

#[derive(Deserialize)]
struct CoordsQuery {
    lat: Option<String>,
    lon: Option<String>,
}

fn required_text(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!(
            "Query parameter '{name}' is required."
        ))),
    }
}

fn required_coord(value: Option<String>, name: &str) -> ApiResult<f64> {
    let raw = required_text(value, name)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadRequest(format!("Query parameter '{name}' must be a number.")))
}

async fn aqi_by_city(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CityQuery>,
) -> ApiResult<Json<AqiResult>> {
    state
        .requests_total
        .add(1, &[KeyValue::new("endpoint", "by-city")]);
    let query = LocationQuery::ByCity {
        city: required_text(q.city, "city")?,
        state: required_text(q.state, "state")?,
    };
    lookup(&state, query).await
}

async fn aqi_by_coords(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CoordsQuery>,
) -> ApiResult<Json<AqiResult>> {
    state
        .requests_total
        .add(1, &[KeyValue::new("endpoint", "by-coords")]);
    let query = LocationQuery::ByCoords {
        lat: required_coord(q.lat, "lat")?,
        lon: required_coord(q.lon, "lon")?,
    };
    lookup(&state, query).await
}

async fn lookup(state: &AppState, query: LocationQuery) -> ApiResult<Json<AqiResult>> {
    let reply = state.source.fetch(&query).await;
    match resolve(reply) {
        Ok(result) => {
            tracing::info!(
                %query,
                aqi = result.aqi,
                category = %result.category,
                raw_pm25 = result.raw_pm25,
                "aqi resolved"
            );
            Ok(Json(result))
        }
        Err(e) => {
            match &e {
                AqiError::UpstreamUnreachable { detail } => {
                    tracing::warn!(%query, %detail, "upstream unreachable");
                }
                AqiError::UpstreamStatus { status, .. } => {
                    tracing::warn!(%query, status, "upstream error status");
                }
                AqiError::NotFound(reason) => {
                    tracing::info!(%query, %reason, "no usable record");
                }
            }
            if e.is_upstream() {
                state
                    .upstream_failures_total
                    .add(1, &[KeyValue::new("kind", e.kind())]);
            }
            Err(e.into())
        }
    }
}
