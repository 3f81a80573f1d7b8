use crate::types::{LocationQuery, UpstreamReply};

/// A provider of raw PM2.5 records for a location.
///
/// Implementations perform the outbound call and classify its outcome. Every
/// failure is expressed as an [`UpstreamReply`] variant.
#[async_trait::async_trait]
pub trait AirQualitySource: Send + Sync {
    async fn fetch(&self, query: &LocationQuery) -> UpstreamReply;
}
