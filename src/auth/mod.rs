// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Self-issued token authentication for the receipt splitter API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in with email and password
//! 2. Server verifies the Argon2 hash and issues an HS256 JWT carrying `user_id`
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The [`Auth`] extractor verifies signature and expiry (no leeway) and
//!    hands the handler an [`AuthenticatedUser`]
//!
//! ## Security
//!
//! - Only HMAC-family algorithms are accepted
//! - Login failures do not reveal whether the email exists
//! - A missing `JWT_SECRET` fails requests with 500 rather than the process

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use password::{hash_password, verify_dummy_password, verify_password, PasswordError};
pub use tokens::TokenIssuer;
