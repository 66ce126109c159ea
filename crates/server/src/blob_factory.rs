use std::sync::Arc;

use campusdocs_blob::BlobStore;
use campusdocs_blob_memory::MemoryBlobStore;

use crate::config::BlobConfig;
use crate::error::ServerError;

/// Construct a [`BlobStore`] from configuration.
pub fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        other => Err(ServerError::Config(format!(
            "unsupported blob backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_builds() {
        let config = BlobConfig::default();
        assert!(create_blob_store(&config).is_ok());
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let config = BlobConfig {
            backend: "s3".to_owned(),
            ..BlobConfig::default()
        };
        assert!(matches!(
            create_blob_store(&config),
            Err(ServerError::Config(_))
        ));
    }
}
