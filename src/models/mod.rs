//! Core data models for the metadata pipeline.
//!
//! All of them serialize as camelCase JSON, which is the wire format of the
//! `/api/*` endpoints.

pub mod analysis;
pub mod metadata;
pub mod optimization;
