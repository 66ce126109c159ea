use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use campusdocs_core::UserId;

use super::identity::Identity;

/// JWT claims embedded in issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    /// Email address.
    pub email: String,
    /// Expiry (seconds since epoch).
    pub exp: usize,
}

/// Manages JWT issuance and validation.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Issue a signed token for the given identity.
    pub fn issue_token(&self, user_id: &UserId, email: &str) -> Result<String, String> {
        #[allow(clippy::cast_possible_truncation)]
        let exp = jsonwebtoken::get_current_timestamp() as usize + self.expiry_seconds as usize;

        let claims = Claims {
            sub: user_id.as_str().to_owned(),
            email: email.to_owned(),
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("JWT encoding failed: {e}"))
    }

    /// Validate a token's signature and expiry, extracting the identity.
    pub fn validate_token(&self, token: &str) -> Result<Identity, String> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| format!("invalid token: {e}"))?;

        let claims = token_data.claims;
        Ok(Identity {
            user_id: UserId::new(claims.sub),
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_validate() {
        let manager = JwtManager::new("test-secret", 3600);
        let token = manager
            .issue_token(&UserId::new("uid-1"), "a@example.edu")
            .unwrap();

        let identity = manager.validate_token(&token).unwrap();
        assert_eq!(identity.user_id.as_str(), "uid-1");
        assert_eq!(identity.email, "a@example.edu");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer
            .issue_token(&UserId::new("uid-1"), "a@example.edu")
            .unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let manager = JwtManager::new("test-secret", 3600);
        assert!(manager.validate_token("not.a.token").is_err());
    }
}
