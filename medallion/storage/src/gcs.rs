//! Google Cloud Storage provider backed by `object_store`.

use std::{collections::HashMap, sync::Arc};

use object_store::gcp::GoogleCloudStorageBuilder;
use tracing::warn;
use url::Url;

use crate::{ObjectStoreProvider, Result, StorageError};

/// Provider for `gs://` and `gcs://` locations.
///
/// Credentials are taken from `GOOGLE_APPLICATION_CREDENTIALS`; the options
/// map can override `service_account`, `service_account_key` and
/// `application_credentials`.
pub struct GcsProvider;

impl ObjectStoreProvider for GcsProvider {
    fn supports_scheme(&self, scheme: &str) -> bool {
        matches!(scheme, "gs" | "gcs")
    }

    fn create_store(
        &self,
        location: &Url,
        options: &HashMap<String, String>,
    ) -> Result<Arc<dyn object_store::ObjectStore>> {
        let mut builder = GoogleCloudStorageBuilder::from_env();

        if let Some(bucket) = location.host_str() {
            builder = builder.with_bucket_name(bucket);
        }

        for (key, value) in options {
            builder = match key.trim_start_matches("google_") {
                "service_account" => builder.with_service_account_path(value),
                "service_account_key" => builder.with_service_account_key(value),
                "application_credentials" => builder.with_application_credentials(value),
                unknown => {
                    warn!("Ignoring unknown gcs option: {unknown}");
                    builder
                }
            };
        }

        builder
            .build()
            .map(|store| Arc::new(store) as Arc<dyn object_store::ObjectStore>)
            .map_err(|source| StorageError::StoreCreation {
                location: location.to_string(),
                source,
            })
    }
}
