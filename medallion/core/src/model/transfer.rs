//! Models for the pre-transformation transfer step

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use url::Url;

pub type Result<T> = core::result::Result<T, TransferError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum TransferError {
    #[error("Invalid transfer source 's3://{bucket}': {reason}")]
    #[diagnostic(
        code(medallion::transfer::invalid_source),
        help("The source bucket must form a valid s3:// URL, optionally followed by a key prefix")
    )]
    InvalidSource { bucket: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] medallion_storage::StorageError),

    #[error("Object store operation failed during transfer")]
    #[diagnostic(code(medallion::transfer::object_store))]
    ObjectStore(#[from] object_store::Error),
}

fn default_source_conn() -> String {
    "aws_default".to_string()
}

fn default_dest_conn() -> String {
    "google_cloud_default".to_string()
}

/// Declarative description of a single data movement executed before the
/// first transformation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct TransferStep {
    /// Source bucket name
    pub source_bucket: String,

    /// Key prefix limiting which objects are transferred
    #[serde(default)]
    pub source_prefix: Option<String>,

    /// Connection identifier used to authenticate against the source store
    #[serde(default = "default_source_conn")]
    pub source_conn_id: String,

    /// Connection identifier used to authenticate against the destination store
    #[serde(default = "default_dest_conn")]
    pub dest_conn_id: String,

    /// Destination storage location, e.g. `gs://lake/landing`
    pub destination: Url,

    /// Overwrite objects that already exist at the destination
    #[serde(default)]
    pub replace: bool,

    /// Keep the full source key (prefix included) under the destination
    /// location instead of stripping `source_prefix` from it
    #[serde(default)]
    pub apply_dest_prefix: bool,
}

impl TransferStep {
    /// Resolve the declarative step into a transfer descriptor with concrete
    /// source and destination URLs. The descriptor's `overwrite` flag always
    /// equals the declared `replace` flag.
    pub fn resolve(&self) -> Result<TransferDescriptor> {
        let raw = match &self.source_prefix {
            Some(prefix) => format!("s3://{}/{}", self.source_bucket, prefix),
            None => format!("s3://{}", self.source_bucket),
        };

        let source = Url::parse(&raw).map_err(|err| TransferError::InvalidSource {
            bucket: self.source_bucket.clone(),
            reason: err.to_string(),
        })?;

        if source.host_str().map_or(true, str::is_empty) {
            return Err(TransferError::InvalidSource {
                bucket: self.source_bucket.clone(),
                reason: "bucket name does not form a URL host".to_string(),
            });
        }

        Ok(TransferDescriptor {
            source,
            destination: self.destination.clone(),
            overwrite: self.replace,
            source_prefix: self.source_prefix.clone(),
            apply_dest_prefix: self.apply_dest_prefix,
            source_conn_id: self.source_conn_id.clone(),
            dest_conn_id: self.dest_conn_id.clone(),
        })
    }
}

/// Resolved transfer descriptor consumed by the transfer executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferDescriptor {
    /// Fully qualified source URL
    pub source: Url,

    /// Fully qualified destination URL
    pub destination: Url,

    /// Overwrite existing destination objects
    pub overwrite: bool,

    /// Source key prefix the listing is restricted to
    pub source_prefix: Option<String>,

    /// Keep the source prefix in destination keys
    pub apply_dest_prefix: bool,

    /// Connection identifier for the source store
    pub source_conn_id: String,

    /// Connection identifier for the destination store
    pub dest_conn_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> TransferStep {
        TransferStep {
            source_bucket: "raw-landing".to_string(),
            source_prefix: Some("exports/daily".to_string()),
            source_conn_id: default_source_conn(),
            dest_conn_id: default_dest_conn(),
            destination: Url::parse("gs://lake/landing").unwrap(),
            replace: false,
            apply_dest_prefix: false,
        }
    }

    #[test]
    fn resolve_builds_source_url() {
        let descriptor = step().resolve().unwrap();
        assert_eq!(descriptor.source.as_str(), "s3://raw-landing/exports/daily");
        assert_eq!(descriptor.destination.as_str(), "gs://lake/landing");
    }

    #[test]
    fn replace_flag_becomes_overwrite() {
        let mut with_replace = step();
        with_replace.replace = true;

        assert!(with_replace.resolve().unwrap().overwrite);
        assert!(!step().resolve().unwrap().overwrite);
    }

    #[test]
    fn empty_bucket_is_rejected() {
        let mut step = step();
        step.source_bucket = String::new();

        assert!(matches!(
            step.resolve(),
            Err(TransferError::InvalidSource { .. })
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn deserializes_with_defaults() {
        let yaml = r#"
source_bucket: raw-landing
destination: gs://lake/landing
"#;
        let step: TransferStep = serde_yml::from_str(yaml).unwrap();
        assert_eq!(step.source_conn_id, "aws_default");
        assert_eq!(step.dest_conn_id, "google_cloud_default");
        assert!(!step.replace);
        assert!(!step.apply_dest_prefix);
    }
}
