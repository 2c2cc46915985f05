// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAI chat-completion client that turns OCR text into a structured
//! receipt.
//!
//! The model's output is passed through as-is. Any JSON object is accepted;
//! documented keys are exposed as fields and everything else is kept in
//! `extra` maps.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::ReceiptStructurer;

pub const DEFAULT_OPENAI_API_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

const SYSTEM_PROMPT: &str = r#"You are a highly intelligent receipt parsing assistant. Your task is to analyze the provided receipt text and return a structured JSON object with the following format:
{
  "name": "Store Name",
  "modifiers": [
    {"type": "Modifier Type", "value": Value, "percentage": PercentageOfOrder (if applicable)}
  ],
  "items": [
    {"item": "Item Name", "price": PricePerItem, "qty": Quantity}
  ]
}
Important Considerations:
Store Name:
Extract the store's name from the receipt header or footer, wherever applicable.
Modifiers:
Include all price-related adjustments as separate entries in the modifiers array. Each modifier should include:
type: The name of the modifier (e.g., "Service Charge", "Discount").
value: The absolute value of the modifier (e.g., £10.00 for a discount or service charge).
percentage: If the modifier is a percentage of the total order, include the percentage. If not, set this field to null.
Items:
Each item should include:
item: The item's name, accurately extracted even if split across multiple lines.
price: The price per unit of the item. If the price is for multiple units, divide the total price by the quantity to calculate the per-item price. This should not include the currency, just the value.
qty: The quantity of the item. Ensure the correct quantity, even if quantities are specified on separate lines or implied by additional notes like "x2" or "double."
Handle cases where:
The price is listed per line (inclusive or exclusive of totals).
Adjustments (e.g., additions, subtractions, or discounts) are listed on sublines or as notes.
Format Adaptation:
Some receipts might have irregular formats, such as handwritten-style totals, unclear item groupings, or totals including service charges. Adapt accordingly and infer missing information where possible.
Tax:
If tax is explicitly mentioned, include it as a modifier in the modifiers array with type: "Tax". Specify the tax value and its percentage of the total (if applicable).
Error Handling:
If any field cannot be confidently extracted, provide a null value for that field in the JSON and note the reason in a separate "notes" field."#;

const USER_PROMPT_PREFIX: &str =
    "Here is the extracted text from a receipt, ONLY PROVIDE ME THE JSON OBJECT NOTHING ELSE:\n\n ";

#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("OpenAI request failed: {0}")]
    Request(String),

    #[error("OpenAI API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("OpenAI response was invalid: {0}")]
    InvalidResponse(String),

    #[error("no response from OpenAI")]
    EmptyReply,

    #[error("failed to parse OpenAI response: {0}")]
    Parse(String),
}

/// Receipt as returned by the structuring model.
///
/// Every field keeps whatever JSON the model produced. The schema documents
/// the shape the prompt asks for; a key the model left out stays absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct StructuredReceipt {
    /// Store name
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<StructuredItem>>)]
    pub items: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<StructuredModifier>>)]
    pub modifiers: Option<Value>,
    /// Model's explanation for fields it could not extract
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Value>,
    /// Any other keys the model emitted
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: HashMap<String, Value>,
}

impl StructuredReceipt {
    /// Number of entries in `items`, or 0 when it is not an array.
    pub fn item_count(&self) -> usize {
        self.items
            .as_ref()
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

/// Documented shape of one `items` entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct StructuredItem {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub item: Option<Value>,
    /// Price per unit
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub qty: Option<Value>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: HashMap<String, Value>,
}

/// Documented shape of one `modifiers` entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct StructuredModifier {
    #[serde(
        default,
        rename = "type",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub kind: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub percentage: Option<Value>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: HashMap<String, Value>,
}

// A present key maps to `Some`, including an explicit `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Strip surrounding whitespace and an optional markdown code fence
/// (```` ```json ```` or ```` ``` ````) from a model reply.
pub fn clean_model_reply(raw: &str) -> &str {
    let trimmed = raw.trim();
    let opened = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let closed = opened.strip_suffix("```").unwrap_or(opened);
    closed.trim()
}

/// Parse a model reply into a [`StructuredReceipt`]. Any JSON object is
/// accepted once cleaned.
pub fn parse_model_reply(raw: &str) -> Result<StructuredReceipt, OpenAiError> {
    let value: Value = serde_json::from_str(clean_model_reply(raw))
        .map_err(|e| OpenAiError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(OpenAiError::Parse("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| OpenAiError::Parse(e.to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    http: Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OpenAiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            http,
        })
    }
}

#[async_trait]
impl ReceiptStructurer for OpenAiClient {
    async fn structure(&self, raw_text: &str) -> Result<StructuredReceipt, OpenAiError> {
        let user_prompt = format!("{USER_PROMPT_PREFIX}{raw_text}");
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpenAiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "OpenAI API returned an error status");
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OpenAiError::EmptyReply)?;

        debug!(reply = %content, "Raw structuring reply");
        parse_model_reply(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{
        extract::Json,
        http::{HeaderMap, StatusCode, Uri},
        response::IntoResponse,
        Router,
    };
    use serde_json::json;

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(base_url, "sk-test", "gpt-test", Duration::from_secs(5)).unwrap()
    }

    fn upstream(reply: Value, status: StatusCode) -> Router {
        Router::new().fallback(move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
            let reply = reply.clone();
            async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer sk-test");
                if uri.path() != CHAT_COMPLETIONS_PATH || !authorized {
                    return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
                }
                let user = body["messages"][1]["content"].as_str().unwrap_or_default();
                if body["model"] != "gpt-test"
                    || body["messages"][0]["role"] != "system"
                    || !user.starts_with("Here is the extracted text from a receipt")
                    || !user.ends_with("MILK 1.50")
                {
                    return (StatusCode::BAD_REQUEST, Json(json!({}))).into_response();
                }
                (status, Json(reply)).into_response()
            }
        })
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn clean_strips_json_fence() {
        let raw = "  ```json\n{\"name\":\"Tesco\"}\n```  ";
        assert_eq!(clean_model_reply(raw), "{\"name\":\"Tesco\"}");
    }

    #[test]
    fn clean_strips_bare_fence() {
        assert_eq!(clean_model_reply("```\n{}\n```"), "{}");
        assert_eq!(clean_model_reply("{}"), "{}");
    }

    #[test]
    fn fenced_reply_parses_like_unwrapped() {
        let body = r#"{"name":"Tesco","items":[{"item":"Milk","price":1.5,"qty":2}],"modifiers":[]}"#;
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(
            parse_model_reply(&fenced).unwrap(),
            parse_model_reply(body).unwrap()
        );
    }

    #[test]
    fn parse_keeps_unknown_fields_and_nulls() {
        let reply = r#"{
            "name": null,
            "items": [{"item": "Milk", "price": null, "qty": 2, "category": "dairy"}],
            "modifiers": [{"type": "Tax", "value": 0.25, "percentage": 20}],
            "notes": "Store name unreadable",
            "currency": "GBP"
        }"#;
        let parsed = parse_model_reply(reply).unwrap();

        assert_eq!(parsed.name, Some(Value::Null));
        assert_eq!(parsed.extra["currency"], "GBP");
        assert_eq!(parsed.item_count(), 1);

        let out = serde_json::to_value(&parsed).unwrap();
        let expected: Value = serde_json::from_str(reply).unwrap();
        assert_eq!(out, expected);
        assert!(out.as_object().unwrap().contains_key("name"));
    }

    #[test]
    fn parse_accepts_string_typed_numbers() {
        let reply = r#"{
            "name": "Cafe",
            "items": [{"item": "Latte", "price": "3.20", "qty": "2"}],
            "modifiers": [{"type": "Service", "value": "1.50", "percentage": "12.5%"}]
        }"#;
        let parsed = parse_model_reply(reply).unwrap();

        let out = serde_json::to_value(&parsed).unwrap();
        assert_eq!(out["items"][0]["price"], "3.20");
        assert_eq!(out["items"][0]["qty"], "2");
        assert_eq!(out["modifiers"][0]["percentage"], "12.5%");
        assert_eq!(out, serde_json::from_str::<Value>(reply).unwrap());
    }

    #[test]
    fn parse_accepts_unexpected_shapes_for_documented_keys() {
        let reply = r#"{
            "name": {"value": null, "reason": "unreadable"},
            "items": "none found",
            "modifiers": [{"type": 7, "value": [1, 2]}, "loose note"]
        }"#;
        let parsed = parse_model_reply(reply).unwrap();

        assert_eq!(parsed.item_count(), 0);
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            serde_json::from_str::<Value>(reply).unwrap()
        );
    }

    #[test]
    fn omitted_keys_stay_omitted() {
        let parsed = parse_model_reply(r#"{"name": "Tesco"}"#).unwrap();
        let out = serde_json::to_value(&parsed).unwrap();

        assert_eq!(out, json!({ "name": "Tesco" }));
        assert_eq!(parsed.item_count(), 0);

        let empty = serde_json::to_value(parse_model_reply("{}").unwrap()).unwrap();
        assert_eq!(empty, json!({}));
    }

    #[test]
    fn parse_rejects_non_json_and_non_objects() {
        assert!(matches!(
            parse_model_reply("Sorry, I can't read that."),
            Err(OpenAiError::Parse(_))
        ));
        assert!(matches!(parse_model_reply("[1, 2]"), Err(OpenAiError::Parse(_))));
    }

    #[tokio::test]
    async fn structure_parses_fenced_completion() {
        let base_url = spawn_upstream(upstream(
            completion("```json\n{\"name\":\"Tesco\",\"items\":[{\"item\":\"Milk\",\"price\":1.5,\"qty\":1}],\"modifiers\":[]}\n```"),
            StatusCode::OK,
        ))
        .await;

        let receipt = client(&base_url).structure("MILK 1.50").await.unwrap();
        assert_eq!(receipt.name, Some(json!("Tesco")));
        assert_eq!(receipt.items.unwrap()[0]["item"], "Milk");
    }

    #[tokio::test]
    async fn structure_with_no_choices_is_empty_reply() {
        let base_url =
            spawn_upstream(upstream(json!({ "choices": [] }), StatusCode::OK)).await;

        let result = client(&base_url).structure("MILK 1.50").await;
        assert!(matches!(result, Err(OpenAiError::EmptyReply)));
    }

    #[tokio::test]
    async fn structure_reports_upstream_status() {
        let base_url = spawn_upstream(upstream(
            json!({ "error": { "message": "rate limited" } }),
            StatusCode::TOO_MANY_REQUESTS,
        ))
        .await;

        let result = client(&base_url).structure("MILK 1.50").await;
        assert!(matches!(result, Err(OpenAiError::Status { status: 429, .. })));
    }

    #[tokio::test]
    async fn structure_reports_unparseable_reply() {
        let base_url =
            spawn_upstream(upstream(completion("I could not read this receipt."), StatusCode::OK))
                .await;

        let result = client(&base_url).structure("MILK 1.50").await;
        assert!(matches!(result, Err(OpenAiError::Parse(_))));
    }
}
