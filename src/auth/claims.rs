// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};

/// Claims embedded in tokens issued by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Canonical user id
    pub user_id: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Authenticated user information extracted from a verified token.
///
/// Handlers receive this explicitly through the `Auth` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Canonical user id (`user_id` claim)
    pub user_id: String,

    /// Token issue time (Unix timestamp)
    #[serde(skip)]
    pub issued_at: i64,

    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_claims_extracts_user_id_and_times() {
        let user = AuthenticatedUser::from_claims(Claims {
            user_id: "user_123".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        });
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.issued_at, 1_700_000_000);
        assert_eq!(user.expires_at, 1_700_003_600);
    }

    #[test]
    fn serialized_user_only_exposes_id() {
        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            issued_at: 1,
            expires_at: 2,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": "user_123" }));
    }
}
