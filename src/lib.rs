//! solrwatch - a Solr statistics monitoring agent
//!
//! This library samples the statistics exposed by a running Solr server
//! over its HTTP/XML admin interface, normalizes them into snapshots,
//! and derives latest and incremental metric values between consecutive
//! samples.

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod metrics;
pub mod reporting;
pub mod response;
pub mod sampling;

// Re-export core types for convenience
pub use crate::core::*;
