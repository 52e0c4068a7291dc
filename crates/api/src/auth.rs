//! Bearer token authentication.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use domain::Role;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use saga::AuthToken;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Role name, e.g. `USER` or `ROLE_PREMIUM_USER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// Returns the caller's role, `USER` when the claim is absent.
    pub fn role(&self) -> Role {
        self.role.as_deref().map(Role::parse).unwrap_or(Role::User)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for `username`, valid for `ttl`.
    pub fn issue_token(
        &self,
        username: &str,
        role: Option<&str>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            role: role.map(str::to_string),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Generation(e.to_string()))
    }

    /// Validates a token and decodes its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::Invalid("Empty subject".to_string()));
        }
        Ok(data.claims)
    }

    /// Extracts the token from an `Authorization` header value.
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// The authenticated caller of a request.
///
/// Use as a handler argument to require a valid bearer token. The raw
/// token is kept so it can be forwarded to the catalog unchanged.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: Role,
    pub token: AuthToken,
}

impl AuthenticatedUser {
    /// Fails with 403 unless the caller may place orders.
    pub fn require_customer(&self) -> Result<(), ApiError> {
        if self.role.can_place_orders() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Role {} may not place orders",
                self.role
            )))
        }
    }

    /// Fails with 403 unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator role required".to_string()))
        }
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = JwtService::extract_from_header(header).ok_or(AuthError::MalformedHeader)?;

        let claims = state.jwt.validate_token(token).map_err(|e| {
            tracing::warn!(error = %e, uri = %parts.uri, "authentication failed");
            e
        })?;

        Ok(AuthenticatedUser {
            role: claims.role(),
            username: claims.sub,
            token: AuthToken::new(token),
        })
    }
}
