use miette::Diagnostic;

pub type Result<T> = core::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StorageError {
    #[error("Unsupported URL scheme: '{0}'")]
    #[diagnostic(
        code(medallion::storage::unsupported_scheme),
        help(
            "Supported schemes are file:// and memory:// plus any cloud scheme \
             enabled via feature flags (s3:// with 's3', gs:// with 'gcs')"
        )
    )]
    UnsupportedScheme(String),

    #[error("Failed to create object store for '{location}'")]
    #[diagnostic(code(medallion::storage::store_creation))]
    StoreCreation {
        location: String,
        #[source]
        source: object_store::Error,
    },
}
