// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuing and verification.
//!
//! Tokens are HMAC-signed JWTs carrying a `user_id` claim plus `iat`/`exp`.
//! Verification is purely cryptographic: there is no revocation list, so a
//! token stays valid until it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde_json::Value;

use super::{claims::Claims, AuthError, AuthenticatedUser};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Algorithms accepted on verification. Tokens are always issued as HS256.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Issues and verifies identity tokens with a server-side secret.
///
/// The secret is optional so that a misconfigured server still starts;
/// every issue/verify call then fails with [`AuthError::MissingSecret`].
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Option<String>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(AuthError::MissingSecret)
    }

    /// Issue a signed token for a user.
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let secret = self.secret()?;
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Verify a token and return the user it was issued for.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let secret = self.secret()?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::InvalidAlgorithm);
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let token_data = decode::<Value>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::InvalidAlgorithm,
                _ => AuthError::MalformedToken,
            })?;

        let claims = token_data.claims;
        let user_id = claims
            .get("user_id")
            .and_then(Value::as_str)
            .ok_or(AuthError::InvalidPayload)?;

        Ok(AuthenticatedUser::from_claims(Claims {
            user_id: user_id.to_string(),
            iat: claims.get("iat").and_then(Value::as_i64).unwrap_or_default(),
            exp: claims.get("exp").and_then(Value::as_i64).unwrap_or_default(),
        }))
    }
}
