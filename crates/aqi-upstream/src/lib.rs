//! Upstream data provider adapters
//!
//! Fetches PM2.5 records from the data.gov.in air quality dataset and
//! classifies each call into an [`aqi_core::UpstreamReply`].

pub mod datagov;
pub mod query;

pub use datagov::*;
pub use query::*;
