// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Receipt Splitter - receipt OCR and bill-splitting backend
//!
//! Users register and log in, upload a receipt photo to be OCR'd (Google
//! Cloud Vision) and structured into line items (OpenAI), and store the
//! resulting receipts. Splitting arithmetic happens on the client.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, token issuing and the bearer extractor
//! - `providers` - Vision and OpenAI clients behind swappable traits
//! - `storage` - Embedded redb persistence for users and receipts

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
