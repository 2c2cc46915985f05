// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::TokenIssuer,
    providers::{ReceiptStructurer, TextExtractor},
    storage::Database,
};

/// Shared handler state, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: TokenIssuer,
    pub text_extractor: Arc<dyn TextExtractor>,
    pub structurer: Arc<dyn ReceiptStructurer>,
}

impl AppState {
    pub fn new(
        db: Database,
        tokens: TokenIssuer,
        text_extractor: Arc<dyn TextExtractor>,
        structurer: Arc<dyn ReceiptStructurer>,
    ) -> Self {
        Self {
            db: Arc::new(db),
            tokens,
            text_extractor,
            structurer,
        }
    }
}
