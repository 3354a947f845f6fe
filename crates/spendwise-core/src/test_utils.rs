//! Test utilities for spendwise-core
//!
//! Provides a mock Gemini server so the HTTP adapter can be exercised
//! end to end without network access.

use std::net::SocketAddr;

use axum::{
    extract::Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Mock Gemini server for testing and development
///
/// Behaviour is driven by the merchant in the prompt:
/// - a known merchant (Swiggy, Uber, Netflix, Steam, ...) maps to a category name
///   which is returned if it is one of the available categories
/// - merchant containing "garbled" returns non-JSON text
/// - merchant containing "outage" returns HTTP 500
/// - anything else returns `{"categoryName": "Uncategorized"}`
pub struct MockGeminiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// API key the server accepts
    pub const API_KEY: &'static str = "test-gemini-key";

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new().route("/models/:model", get(handle_model).post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == MockGeminiServer::API_KEY)
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"code": 401, "message": "API key not valid"}})),
    )
        .into_response()
}

/// Model metadata endpoint (health check)
async fn handle_model(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"name": "models/mock", "displayName": "Mock Gemini"})).into_response()
}

/// generateContent endpoint
async fn handle_generate(headers: HeaderMap, Json(request): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let prompt = request["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let merchant = prompt_field(prompt, "Merchant:").to_lowercase();
    let categories = available_categories(prompt);

    if merchant.contains("outage") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend unavailable").into_response();
    }

    let text = if merchant.contains("garbled") {
        "I am not sure what this is".to_string()
    } else {
        let answer = guess_category(&merchant)
            .and_then(|guess| categories.iter().find(|c| c.eq_ignore_ascii_case(guess)))
            .map(|name| json!({"categoryName": name, "confidence": 0.93, "reason": "Known merchant"}))
            .unwrap_or_else(|| json!({"categoryName": "Uncategorized", "confidence": 0.1}));
        answer.to_string()
    };

    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

fn prompt_field<'a>(prompt: &'a str, label: &str) -> &'a str {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .unwrap_or_default()
}

fn available_categories(prompt: &str) -> Vec<String> {
    prompt_field(prompt, "Available Categories:")
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn guess_category(merchant: &str) -> Option<&'static str> {
    const KNOWN: &[(&str, &str)] = &[
        ("swiggy", "Food"),
        ("zomato", "Food"),
        ("starbucks", "Food"),
        ("uber", "Travel"),
        ("indigo", "Travel"),
        ("netflix", "Entertainment"),
        ("spotify", "Entertainment"),
        ("steam", "Gaming"),
        ("amazon", "Shopping"),
    ];
    KNOWN
        .iter()
        .find(|(needle, _)| merchant.contains(needle))
        .map(|(_, category)| *category)
}
