//! Bearer token verification.
//!
//! Tokens are issued by the external identity provider and signed with HS256.
//! The service never issues tokens itself.

use connect_common::{AppError, AppResult, config::AuthConfig};
use connect_core::IdentityClaims;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

/// Claims read from an access token.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Subject: the user's id at the identity provider.
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "full_name")]
    name: Option<String>,
}

/// Verifies access tokens against the shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate signature and expiry, returning the identity.
    pub fn verify(&self, token: &str) -> AppResult<IdentityClaims> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized
        })?;

        Ok(IdentityClaims {
            subject: data.claims.sub,
            email: data.claims.email,
            full_name: data.claims.name,
        })
    }
}
