use serde::Deserialize;

use campusdocs_ledger::ProtocolConfig;

/// Top-level configuration for the campusdocs server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store backend configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Blob store and upload policy configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Credit protocol constants.
    #[serde(default)]
    pub credits: CreditsConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8080
}

/// Configuration for the record store backend.
#[derive(Debug, Deserialize)]
pub struct StateConfig {
    /// Which backend to use. Currently only `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

/// Configuration for blob storage and the upload policy.
#[derive(Debug, Deserialize)]
pub struct BlobConfig {
    /// Which backend to use. Currently only `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// MIME types accepted for upload.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Lifetime of issued retrieval URLs, in seconds.
    #[serde(default = "default_url_ttl_seconds")]
    pub url_ttl_seconds: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_content_types: default_allowed_content_types(),
            url_ttl_seconds: default_url_ttl_seconds(),
        }
    }
}

const fn default_max_upload_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    vec!["application/pdf".to_owned()]
}

const fn default_url_ttl_seconds() -> u64 {
    300
}

/// Credit protocol constants.
#[derive(Debug, Deserialize)]
pub struct CreditsConfig {
    /// Credits granted on registration.
    #[serde(default = "default_registration_bonus")]
    pub registration_bonus: u64,
    /// Credits granted to the uploader on approval.
    #[serde(default = "default_approval_reward")]
    pub approval_reward: u64,
    /// Per-download cost when a submission names none.
    #[serde(default = "default_document_cost")]
    pub default_document_cost: u64,
    /// Optimistic attempts per ledger operation before giving up.
    #[serde(default = "default_max_txn_attempts")]
    pub max_txn_attempts: u32,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            registration_bonus: default_registration_bonus(),
            approval_reward: default_approval_reward(),
            default_document_cost: default_document_cost(),
            max_txn_attempts: default_max_txn_attempts(),
        }
    }
}

const fn default_registration_bonus() -> u64 {
    3
}

const fn default_approval_reward() -> u64 {
    5
}

const fn default_document_cost() -> u64 {
    1
}

const fn default_max_txn_attempts() -> u32 {
    5
}

impl CreditsConfig {
    /// Convert to the ledger crate's protocol constants.
    #[must_use]
    pub fn to_protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            registration_bonus: self.registration_bonus,
            approval_reward: self.approval_reward,
            default_document_cost: self.default_document_cost,
            max_txn_attempts: self.max_txn_attempts,
        }
    }
}

/// Authentication configuration.
///
/// The JWT secret can be given here or through the `CAMPUSDOCS_JWT_SECRET`
/// environment variable; the environment wins.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing and validating tokens.
    pub jwt_secret: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_expiry_seconds")]
    pub token_expiry_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_seconds: default_token_expiry_seconds(),
        }
    }
}

const fn default_token_expiry_seconds() -> u64 {
    86_400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.state.backend, "memory");
        assert_eq!(config.blob.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.blob.allowed_content_types, vec!["application/pdf"]);
        assert_eq!(config.credits.registration_bonus, 3);
        assert_eq!(config.credits.approval_reward, 5);
        assert_eq!(config.credits.default_document_cost, 1);
        assert_eq!(config.credits.max_txn_attempts, 5);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn partial_sections_keep_defaults_elsewhere() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [credits]
            approval_reward = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.credits.approval_reward, 10);
        assert_eq!(config.credits.registration_bonus, 3);
    }

    #[test]
    fn credits_convert_to_protocol_config() {
        let credits = CreditsConfig {
            registration_bonus: 4,
            approval_reward: 6,
            default_document_cost: 2,
            max_txn_attempts: 3,
        };
        let protocol = credits.to_protocol_config();
        assert_eq!(protocol.registration_bonus, 4);
        assert_eq!(protocol.approval_reward, 6);
        assert_eq!(protocol.default_document_cost, 2);
        assert_eq!(protocol.max_txn_attempts, 3);
    }
}
