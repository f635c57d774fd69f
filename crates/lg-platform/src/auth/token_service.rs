//! Token Service
//!
//! Session JWT generation and validation.
//! RS256 (RSA keys from PEM) for production, HS256 (shared secret) for
//! development.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profile::entity::Role;
use crate::shared::error::{PortalError, Result};

/// Claims carried in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub email: String,
    pub role: Role,
    /// Home tenant, absent for masters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// RSA private key PEM (RS256). Takes precedence over `secret_key`.
    pub rsa_private_key: Option<String>,
    /// RSA public key PEM (RS256)
    pub rsa_public_key: Option<String>,
    /// HMAC secret for HS256 fallback
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    /// Session lifetime in seconds
    pub session_expiry_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            rsa_private_key: None,
            rsa_public_key: None,
            secret_key: String::new(),
            issuer: "learngate".to_string(),
            audience: "learngate".to_string(),
            session_expiry_secs: 28800, // 8 hours
        }
    }
}

pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenService {
    /// RS256 from PEM key pair.
    pub fn new_with_rsa(config: TokenConfig, private_pem: &str, public_pem: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| PortalError::Configuration {
                message: format!("Invalid RSA private key: {}", e),
            })?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| PortalError::Configuration {
                message: format!("Invalid RSA public key: {}", e),
            })?;

        info!("TokenService initialized with RS256");

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
        })
    }

    /// HS256 from the configured secret.
    pub fn new_with_secret(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!("TokenService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
            algorithm: Algorithm::HS256,
        }
    }

    /// RSA when both keys are configured, HMAC otherwise.
    pub fn new(config: TokenConfig) -> Result<Self> {
        if let (Some(private_pem), Some(public_pem)) =
            (config.rsa_private_key.clone(), config.rsa_public_key.clone())
        {
            return Self::new_with_rsa(config, &private_pem, &public_pem);
        }
        if config.secret_key.is_empty() {
            return Err(PortalError::Configuration {
                message: "Either RSA keys or a JWT secret must be configured".to_string(),
            });
        }
        Ok(Self::new_with_secret(config))
    }

    /// Issue a session token for a verified, fully-gated login.
    pub fn generate_session(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        tenant_id: Option<String>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.session_expiry_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            email: email.to_string(),
            role,
            tenant_id,
        };

        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| PortalError::Internal { message: format!("Failed to encode JWT: {}", e) })
    }

    /// Validate a session token and extract its claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PortalError::TokenExpired,
                _ => PortalError::InvalidToken { message: e.to_string() },
            })
    }
}

/// Extract a bearer token from an Authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}
