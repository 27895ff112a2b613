//! Data models for pipeline definitions
//!
//! These models are serializable and deserializable, allowing a layered
//! pipeline to be declared in a configuration file (YAML, JSON, TOML) and
//! loaded at runtime. The module includes:
//!
//! - Layer and stage definitions for the medallion lineage
//! - Transfer step definitions for the pre-transformation data movement
//! - Retry and failure-handling policies

pub mod policy;
pub mod stages;
pub mod transfer;

pub use policy::{FailureMode, RetryPolicy};
pub use stages::{Layer, Stage};
pub use transfer::{TransferDescriptor, TransferError, TransferStep};
