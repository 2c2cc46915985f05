// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google Cloud Vision text extraction.

use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TextExtractor;

pub const DEFAULT_VISION_API_BASE_URL: &str = "https://vision.googleapis.com";
const ANNOTATE_PATH: &str = "/v1/images:annotate";
const DATA_URL_PREFIX: &str = "data:image";

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("image payload is not valid base64")]
    InvalidImage,

    #[error("Vision request failed: {0}")]
    Request(String),

    #[error("Vision API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Vision response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Vision API reported an error: {0}")]
    Api(String),

    #[error("no text detected in image")]
    NoText,
}

/// Strip an optional `data:image/...;base64,` prefix and check that what
/// remains is standard padded base64. Line breaks and other ASCII
/// whitespace (MIME-wrapped payloads) are removed first.
///
/// Returns the bare base64 content as sent to the OCR service.
pub fn prepare_image(payload: &str) -> Result<Cow<'_, str>, VisionError> {
    let content = if payload.starts_with(DATA_URL_PREFIX) {
        payload
            .split_once(',')
            .map(|(_, rest)| rest)
            .ok_or(VisionError::InvalidImage)?
    } else {
        payload
    };

    let content = if content.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(content.split_ascii_whitespace().collect::<String>())
    } else {
        Cow::Borrowed(content)
    };

    if content.is_empty() || Base64::decode_vec(&content).is_err() {
        return Err(VisionError::InvalidImage);
    }
    Ok(content)
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent<'a>,
    features: [Feature; 1],
}

#[derive(Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

/// Client for the `images:annotate` endpoint using TEXT_DETECTION.
#[derive(Debug, Clone)]
pub struct GoogleVisionClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl GoogleVisionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, VisionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VisionError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    fn annotate_url(&self) -> String {
        format!("{}{}", self.base_url, ANNOTATE_PATH)
    }
}

#[async_trait]
impl TextExtractor for GoogleVisionClient {
    async fn extract_text(&self, image_base64: &str) -> Result<String, VisionError> {
        let content = prepare_image(image_base64)?;

        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent { content: &content },
                features: [Feature {
                    kind: "TEXT_DETECTION",
                    max_results: 1,
                }],
            }],
        };

        let response = self
            .http
            .post(self.annotate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Vision API returned an error status");
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse(e.to_string()))?;

        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| VisionError::InvalidResponse("empty responses array".to_string()))?;

        if let Some(error) = first.error {
            return Err(VisionError::Api(error.message));
        }

        let text = first
            .full_text_annotation
            .map(|annotation| annotation.text)
            .filter(|text| !text.is_empty())
            .ok_or(VisionError::NoText)?;

        debug!(chars = text.len(), "Extracted receipt text");
        Ok(text)
    }
}
