use aqi_config::UpstreamConfig;
use aqi_core::{AirQualitySource, LocationQuery, UpstreamPayload, UpstreamReply};
use anyhow::Result;
use reqwest::Client;

use crate::query::{build_url, redact};

/// Source backed by the data.gov.in dataset API
pub struct DataGovSource {
    client: Client,
    config: UpstreamConfig,
}

impl DataGovSource {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("aqi-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn request_url(&self, query: &LocationQuery) -> String {
        build_url(
            &self.config.dataset_url,
            &self.config.api_key,
            self.config.limit,
            query,
        )
    }
}

#[async_trait::async_trait]
impl AirQualitySource for DataGovSource {
    async fn fetch(&self, query: &LocationQuery) -> UpstreamReply {
        let url = self.request_url(query);
        tracing::debug!(url = %redact(&url), %query, "requesting upstream records");

        // reqwest errors embed the request URL, key included
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let e = e.without_url();
                tracing::warn!(error = %e, timeout = e.is_timeout(), "upstream request failed");
                return UpstreamReply::Unreachable {
                    detail: e.to_string(),
                };
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "upstream returned error status");
            return UpstreamReply::HttpStatus {
                status: status.as_u16(),
                body,
            };
        }

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = e.without_url();
                tracing::warn!(error = %e, "failed to read upstream body");
                return UpstreamReply::Unreachable {
                    detail: e.to_string(),
                };
            }
        };

        match serde_json::from_slice::<UpstreamPayload>(&bytes) {
            Ok(payload) => {
                tracing::debug!(records = payload.records.len(), "upstream records received");
                UpstreamReply::Payload(payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, "upstream body is not a valid payload");
                UpstreamReply::Unreachable {
                    detail: format!("invalid payload: {e}"),
                }
            }
        }
    }
}
