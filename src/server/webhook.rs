//! GitHub push webhook that triggers a cache refresh

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::ServerState;
use crate::config::WebhookConfig;
use crate::refresh::is_markdown_file;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the `sha256=<hex>` signature of the body
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    commits: Vec<PushCommit>,
    #[serde(default)]
    repository: PushRepository,
}

#[derive(Debug, Default, Deserialize)]
struct PushCommit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
    #[serde(default)]
    removed: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PushRepository {
    #[serde(default)]
    full_name: String,
}

impl PushPayload {
    fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
    }

    fn touches_markdown(&self) -> bool {
        self.commits.iter().any(|commit| {
            commit
                .added
                .iter()
                .chain(&commit.modified)
                .chain(&commit.removed)
                .any(|path| is_markdown_file(path))
        })
    }
}

fn reply(status: StatusCode, key: &str, message: impl Into<String>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), serde_json::Value::String(message.into()));
    (status, Json(serde_json::Value::Object(body))).into_response()
}

pub(super) async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let config: &WebhookConfig = &state.site.config.webhook;

    let Some(secret) = config.secret.as_deref().filter(|s| !s.is_empty()) else {
        tracing::error!("Webhook received but no secret is configured");
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "error",
            "webhook secret not configured",
        );
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if !verify_signature(secret, signature, &body) {
        tracing::warn!("Rejected webhook with invalid signature");
        return reply(StatusCode::UNAUTHORIZED, "error", "invalid signature");
    }

    let payload: PushPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Rejected webhook with invalid payload: {}", e);
            return reply(StatusCode::BAD_REQUEST, "error", "invalid payload");
        }
    };

    let branch = payload.branch();
    if !config.branches.iter().any(|b| b == branch) {
        tracing::info!("Ignoring push to branch {}", branch);
        return reply(
            StatusCode::OK,
            "message",
            format!("ignored push to {}", branch),
        );
    }

    if !payload.touches_markdown() {
        tracing::info!("Ignoring push without markdown changes");
        return reply(StatusCode::OK, "message", "no markdown changes");
    }

    tracing::info!(
        "Push to {} on {} changed markdown, refreshing",
        payload.repository.full_name,
        branch
    );

    match state.site.refresh().await {
        Ok(report) => {
            let body = serde_json::json!({
                "message": "content refreshed",
                "posts": report.loaded,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!("Webhook refresh failed: {}", e);
            reply(StatusCode::INTERNAL_SERVER_ERROR, "error", "failed to refresh content")
        }
    }
}

/// Check a `sha256=<hex>` signature header against `body`
pub fn verify_signature(secret: &str, signature: Option<&str>, body: &[u8]) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    let Some(sig_hex) = signature.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(provided) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Compute the `sha256=<hex>` signature header value for `body`
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
