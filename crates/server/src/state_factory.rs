use std::sync::Arc;

use campusdocs_state::RecordStore;
use campusdocs_state_memory::MemoryRecordStore;

use crate::config::StateConfig;
use crate::error::ServerError;

/// Construct a [`RecordStore`] from configuration.
pub fn create_record_store(config: &StateConfig) -> Result<Arc<dyn RecordStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryRecordStore::new())),
        other => Err(ServerError::Config(format!(
            "unsupported state backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_builds() {
        let config = StateConfig::default();
        assert!(create_record_store(&config).is_ok());
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let config = StateConfig {
            backend: "cassandra".to_owned(),
        };
        assert!(matches!(
            create_record_store(&config),
            Err(ServerError::Config(_))
        ));
    }
}
