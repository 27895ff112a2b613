//! Amazon S3 provider backed by `object_store`.

use std::{collections::HashMap, sync::Arc};

use object_store::aws::AmazonS3Builder;
use tracing::warn;
use url::Url;

use crate::{ObjectStoreProvider, Result, StorageError};

/// Provider for `s3://` and `s3a://` locations.
///
/// Credentials are taken from the standard AWS environment variables
/// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, ...); the
/// options map can override `access_key_id`, `secret_access_key`, `region`,
/// `endpoint`, `session_token` and `allow_http`.
pub struct S3Provider;

impl ObjectStoreProvider for S3Provider {
    fn supports_scheme(&self, scheme: &str) -> bool {
        matches!(scheme, "s3" | "s3a")
    }

    fn create_store(
        &self,
        location: &Url,
        options: &HashMap<String, String>,
    ) -> Result<Arc<dyn object_store::ObjectStore>> {
        let mut builder = AmazonS3Builder::from_env();

        if let Some(bucket) = location.host_str() {
            builder = builder.with_bucket_name(bucket);
        }

        for (key, value) in options {
            builder = match key.trim_start_matches("aws_") {
                "access_key_id" => builder.with_access_key_id(value),
                "secret_access_key" => builder.with_secret_access_key(value),
                "region" => builder.with_region(value),
                "endpoint" => builder.with_endpoint(value),
                "session_token" => builder.with_token(value),
                "allow_http" => builder.with_allow_http(value.parse().unwrap_or(false)),
                unknown => {
                    warn!("Ignoring unknown s3 option: {unknown}");
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
