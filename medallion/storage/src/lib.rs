//! Object storage access for Medallion pipelines.
//!
//! Transfer steps resolve their endpoints to URLs; this crate turns those
//! URLs into `object_store` instances. Local file systems and in-memory
//! stores are always available, cloud providers are feature-gated:
//!
//! - `file://` - local file system
//! - `memory://` - in-memory storage (used by the test suite)
//! - `s3://`, `s3a://` - Amazon S3 (feature "s3")
//! - `gs://`, `gcs://` - Google Cloud Storage (feature "gcs")
//!
//! Cloud providers read their credentials from the conventional environment
//! variables and accept per-call overrides through an options map keyed by
//! the connection identifier declared on the transfer step.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use url::Url;

pub mod error;

#[cfg(feature = "gcs")]
mod gcs;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "gcs")]
pub use gcs::GcsProvider;
#[cfg(feature = "s3")]
pub use s3::S3Provider;

pub use error::{Result, StorageError};

/// Trait implemented by each storage backend.
///
/// A provider declares which URL schemes it handles and builds an
/// `object_store` instance for a location it supports.
pub trait ObjectStoreProvider: Send + Sync {
    /// Check whether this provider handles the given URL scheme.
    fn supports_scheme(&self, scheme: &str) -> bool;

    /// Create an object store for the given location.
    fn create_store(
        &self,
        location: &Url,
        options: &HashMap<String, String>,
    ) -> Result<Arc<dyn object_store::ObjectStore>>;
}

/// Registry holding every provider enabled in this build.
pub struct ObjectStoreRegistry {
    providers: Vec<Box<dyn ObjectStoreProvider>>,
}

impl ObjectStoreRegistry {
    #[allow(clippy::vec_init_then_push)]
    pub fn new() -> Self {
        let mut providers: Vec<Box<dyn ObjectStoreProvider>> = Vec::new();

        #[cfg(feature = "s3")]
        providers.push(Box::new(S3Provider));

        #[cfg(feature = "gcs")]
        providers.push(Box::new(GcsProvider));

        providers.push(Box::new(LocalProvider));

        Self { providers }
    }

    /// Create an object store for the given location using the first
    /// provider that supports its scheme.
    pub fn create_store(
        &self,
        location: &Url,
        options: &HashMap<String, String>,
    ) -> Result<Arc<dyn object_store::ObjectStore>> {
        self.providers
            .iter()
            .find(|provider| provider.supports_scheme(location.scheme()))
            .ok_or_else(|| StorageError::UnsupportedScheme(location.scheme().to_string()))?
            .create_store(location, options)
    }
}

impl Default for ObjectStoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for `file://` and `memory://` locations.
pub struct LocalProvider;

impl ObjectStoreProvider for LocalProvider {
    fn supports_scheme(&self, scheme: &str) -> bool {
        matches!(scheme, "file" | "memory")
    }

    fn create_store(
        &self,
        location: &Url,
        _options: &HashMap<String, String>,
    ) -> Result<Arc<dyn object_store::ObjectStore>> {
        match location.scheme() {
            "file" => Ok(Arc::new(object_store::local::LocalFileSystem::new())),
            "memory" => Ok(Arc::new(object_store::memory::InMemory::new())),
            scheme => Err(StorageError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<ObjectStoreRegistry> = OnceLock::new();

/// Global provider registry, created on first access.
pub fn global_registry() -> &'static ObjectStoreRegistry {
    GLOBAL_REGISTRY.get_or_init(ObjectStoreRegistry::new)
}

/// Convenience wrapper over [`global_registry`] for a single location.
pub fn create_store(
    location: &Url,
    options: &HashMap<String, String>,
) -> Result<Arc<dyn object_store::ObjectStore>> {
    global_registry().create_store(location, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_provider_schemes() {
        let provider = LocalProvider;
        assert!(provider.supports_scheme("file"));
        assert!(provider.supports_scheme("memory"));
        assert!(!provider.supports_scheme("s3"));
        assert!(!provider.supports_scheme("gs"));
    }

    #[test]
    fn registry_creates_memory_store() {
        let url = Url::parse("memory:///").unwrap();
        let store = global_registry().create_store(&url, &HashMap::new());
        assert!(store.is_ok());
    }

    #[test]
    fn registry_rejects_unknown_scheme() {
        let url = Url::parse("ftp://example.com/bucket").unwrap();
        let result = global_registry().create_store(&url, &HashMap::new());

        match result {
            Err(StorageError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "ftp"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[cfg(feature = "s3")]
    #[test]
    fn s3_provider_schemes() {
        let provider = S3Provider;
        assert!(provider.supports_scheme("s3"));
        assert!(provider.supports_scheme("s3a"));
        assert!(!provider.supports_scheme("gs"));
    }

    #[cfg(feature = "gcs")]
    #[test]
    fn gcs_provider_schemes() {
        let provider = GcsProvider;
        assert!(provider.supports_scheme("gs"));
        assert!(provider.supports_scheme("gcs"));
        assert!(!provider.supports_scheme("s3"));
    }
}
