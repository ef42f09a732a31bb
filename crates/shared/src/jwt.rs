//! Session token verification.
//!
//! Participants and admins sign in through the external OTP auth service,
//! which issues RS256 access tokens. This module verifies those tokens and,
//! for local development and tests, can mint tokens with the same shape.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Token signing is not configured")]
    SigningUnavailable,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token ID
    pub jti: String,
    /// Email the OTP was sent to, when the issuer includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Token type; only access tokens open a session here.
    pub token_type: TokenType,
}

impl SessionClaims {
    /// Parses the subject as a user ID.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Type of session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Verifies (and optionally signs) session tokens.
#[derive(Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
    /// Lifetime of tokens minted by [`JwtConfig::generate_access_token`].
    pub access_token_expiry_secs: i64,
    /// Leeway in seconds for clock skew tolerance.
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("can_sign", &self.encoding_key.is_some())
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Creates a verifier from the auth service's RSA public key.
    ///
    /// `private_key_pem` is optional; an empty string yields a verify-only
    /// config, which is the normal production setup.
    pub fn from_rsa_pem(
        public_key_pem: &str,
        private_key_pem: &str,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        let encoding_key = if private_key_pem.trim().is_empty() {
            None
        } else {
            Some(
                EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
                    .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?,
            )
        };

        Ok(Self {
            algorithm: Algorithm::RS256,
            decoding_key,
            encoding_key,
            access_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Creates an HS256 config from a shared secret.
    /// Only meant for tests and local tooling.
    pub fn from_secret(secret: &str, access_token_expiry_secs: i64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            access_token_expiry_secs,
            leeway_secs: 0,
        }
    }

    /// Mints an access token for the given user.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
    ) -> Result<(String, String), JwtError> {
        self.generate_token(user_id, email, TokenType::Access, self.access_token_expiry_secs)
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        token_type: TokenType,
        expiry_secs: i64,
    ) -> Result<(String, String), JwtError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or(JwtError::SigningUnavailable)?;

        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            email: email.map(str::to_string),
            token_type,
        };

        let token = encode(&Header::new(self.algorithm), &claims, key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                    _ => JwtError::DecodingError(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Validates a token and requires it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }
}
