//! Object copy between two stores
//!
//! The transfer walks the source listing under the configured prefix and
//! copies each object to the destination. With `overwrite` unset, objects
//! that already exist at the destination are left untouched.

use std::sync::Arc;

use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore};
use tracing::{debug, instrument};

use crate::model::transfer::{Result, TransferDescriptor, TransferError};

/// Counters describing a completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub copied: usize,
    pub skipped: usize,
}

/// Copy every object under the descriptor's source prefix to the
/// destination store.
#[instrument(skip(source, destination), fields(source = %descriptor.source, destination = %descriptor.destination))]
pub async fn copy_objects(
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    descriptor: &TransferDescriptor,
) -> Result<TransferOutcome> {
    let prefix = descriptor.source_prefix.as_deref().map(Path::from);
    let mut outcome = TransferOutcome::default();

    let mut listing = source.list(prefix.as_ref());
    while let Some(meta) = listing.try_next().await? {
        let target = destination_key(descriptor, &meta.location);

        if !descriptor.overwrite {
            match destination.head(&target).await {
                Ok(_) => {
                    debug!("Skipping existing object {target}");
                    outcome.skipped += 1;
                    continue;
                }
                Err(object_store::Error::NotFound { .. }) => {}
                Err(err) => return Err(TransferError::ObjectStore(err)),
            }
        }

        let data = source.get(&meta.location).await?.bytes().await?;
        destination.put(&target, data.into()).await?;

        debug!("Copied {} to {target}", meta.location);
        outcome.copied += 1;
    }

    Ok(outcome)
}

/// Destination key for a source object.
///
/// By default the source prefix is stripped, so objects land directly under
/// the destination location. With `apply_dest_prefix` the full source key is
/// kept, prefix included.
fn destination_key(descriptor: &TransferDescriptor, location: &Path) -> Path {
    let key = location.to_string();

    let relative = if descriptor.apply_dest_prefix {
        key.as_str()
    } else {
        match descriptor.source_prefix.as_deref() {
            Some(prefix) => key
                .strip_prefix(prefix)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(key.as_str()),
            None => key.as_str(),
        }
    };

    let base = descriptor.destination.path().trim_matches('/');
    if base.is_empty() {
        Path::from(relative)
    } else {
        Path::from(format!("{base}/{relative}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn descriptor(prefix: Option<&str>, apply_dest_prefix: bool) -> TransferDescriptor {
        TransferDescriptor {
            source: Url::parse("s3://raw-landing").unwrap(),
            destination: Url::parse("gs://lake/landing").unwrap(),
            overwrite: false,
            source_prefix: prefix.map(str::to_string),
            apply_dest_prefix,
            source_conn_id: "aws_default".to_string(),
            dest_conn_id: "google_cloud_default".to_string(),
        }
    }

    #[test]
    fn strips_source_prefix_by_default() {
        let key = destination_key(
            &descriptor(Some("exports/daily"), false),
            &Path::from("exports/daily/orders.parquet"),
        );
        assert_eq!(key.to_string(), "landing/orders.parquet");
    }

    #[test]
    fn keeps_full_key_with_dest_prefix() {
        let key = destination_key(
            &descriptor(Some("exports/daily"), true),
            &Path::from("exports/daily/orders.parquet"),
        );
        assert_eq!(key.to_string(), "landing/exports/daily/orders.parquet");
    }

    #[test]
    fn no_prefix_copies_key_verbatim() {
        let key = destination_key(&descriptor(None, false), &Path::from("orders.parquet"));
        assert_eq!(key.to_string(), "landing/orders.parquet");
    }
}
