//! Core data types, AQI calculation, and record resolution for the PM2.5 proxy
//!
//! This crate holds the pure parts of the service: converting a PM2.5
//! concentration into an Air Quality Index and picking the first usable
//! record out of an upstream response. It performs no I/O.

pub mod calculator;
pub mod error;
pub mod resolver;
pub mod source;
pub mod types;

pub use calculator::*;
pub use error::*;
pub use resolver::*;
pub use source::*;
pub use types::*;
