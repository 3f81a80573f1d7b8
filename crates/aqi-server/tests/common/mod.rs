#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use aqi_core::{
    AirQualitySource, CandidateRecord, FieldValue, LocationQuery, UpstreamPayload, UpstreamReply,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use tower::ServiceExt;

/// Source that answers every query with a canned reply and remembers what it was asked
pub struct StubSource {
    reply: UpstreamReply,
    pub seen: Mutex<Vec<LocationQuery>>,
}

impl StubSource {
    pub fn new(reply: UpstreamReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<LocationQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AirQualitySource for StubSource {
    async fn fetch(&self, query: &LocationQuery) -> UpstreamReply {
        self.seen.lock().unwrap().push(query.clone());
        self.reply.clone()
    }
}

pub fn record(avg: &str, last_update: &str) -> CandidateRecord {
    CandidateRecord {
        avg_value: Some(FieldValue::Text(avg.to_string())),
        last_update: Some(last_update.to_string()),
        city: Some("Delhi".into()),
        state: Some("Delhi".into()),
        ..Default::default()
    }
}

pub fn payload(records: Vec<CandidateRecord>) -> UpstreamReply {
    UpstreamReply::Payload(UpstreamPayload { records })
}

pub fn app_with(source: Arc<StubSource>) -> Router {
    let (app, _state) = aqi_server::build_app(source, &["*".to_string()]).unwrap();
    app
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
