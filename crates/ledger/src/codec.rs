//! Record key builders and JSON payload codec shared by the ledger modules.

use serde::Serialize;
use serde::de::DeserializeOwned;

use campusdocs_core::{DocumentId, UserId};
use campusdocs_state::{Collection, RecordKey};

use crate::error::LedgerError;

/// Key of a user's ledger record.
#[must_use]
pub fn user_key(id: &UserId) -> RecordKey {
    RecordKey::new(Collection::Users, id.as_str())
}

/// Key of a document's registry entry.
#[must_use]
pub fn document_key(id: &DocumentId) -> RecordKey {
    RecordKey::new(Collection::Documents, id.as_str())
}

/// Serialize a record payload to its stored JSON form.
pub fn encode<T: Serialize>(value: &T) -> Result<String, LedgerError> {
    serde_json::to_string(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

/// Deserialize a stored JSON payload.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, LedgerError> {
    serde_json::from_str(raw).map_err(|e| LedgerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_collection_scoped() {
        let uk = user_key(&UserId::new("u1"));
        let dk = document_key(&DocumentId::new("u1"));
        assert_ne!(uk, dk, "same id in different collections must not collide");
        assert_eq!(uk.canonical(), "users:u1");
        assert_eq!(dk.canonical(), "documents:u1");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode::<campusdocs_core::User>("not json").unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }
}
