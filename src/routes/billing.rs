// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Billing routes: checkout session creation and the Stripe webhook.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Extension, Json, Router,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Plan;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Reject webhook events whose signature timestamp is older than this.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Checkout routes (behind auth middleware).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/billing/checkout", post(create_checkout))
        .route("/api/billing/checkout-test", post(create_checkout_test))
}

/// Webhook routes (public; authenticated by signature instead).
pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new().route("/billing/webhook", post(handle_webhook))
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Create a premium subscription checkout session.
async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CheckoutResponse>> {
    let session = state.checkout.create_premium_session(&user.user_id).await?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Create a low-value one-off checkout session (integration smoke test).
async fn create_checkout_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CheckoutResponse>> {
    let session = state.checkout.create_test_session(&user.user_id).await?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

// ─── Webhook ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Deserialize)]
struct WebhookEventData {
    object: serde_json::Value,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// Stripe event webhook.
///
/// The raw body is verified against the `Stripe-Signature` header before
/// parsing. Only `checkout.session.completed` is acted on; other event
/// types are acknowledged and ignored.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>> {
    let signature_header = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    verify_signature(
        signature_header,
        &body,
        &state.config.stripe_webhook_secret,
        now,
    )?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    if event.event_type == "checkout.session.completed" {
        let session = &event.data.object;
        let user_id = session.get("client_reference_id").and_then(|v| v.as_str());
        // The one-off test product also completes a checkout session; only
        // the subscription upgrades the plan.
        let mode = session.get("mode").and_then(|v| v.as_str());

        match (user_id, mode) {
            (Some(user_id), Some("subscription")) => {
                upgrade_to_premium(&state, user_id).await?
            }
            (Some(user_id), _) => {
                tracing::info!(user_id, ?mode, "Ignoring non-subscription checkout");
            }
            (None, _) => {
                tracing::warn!("checkout.session.completed without client_reference_id");
            }
        }
    } else {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
    }

    Ok(Json(WebhookResponse { received: true }))
}

async fn upgrade_to_premium(state: &Arc<AppState>, user_id: &str) -> Result<()> {
    let mut user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    user.plan = Plan::Premium;
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id, "Upgraded to premium");
    Ok(())
}

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against
/// the raw payload.
fn verify_signature(header: &str, payload: &str, secret: &str, now: i64) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::BadRequest("Malformed signature header".to_string()))?;
    if signatures.is_empty() {
        return Err(AppError::BadRequest(
            "Malformed signature header".to_string(),
        ));
    }

    if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(AppError::BadRequest(
            "Signature timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!("{}.{}", timestamp, payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    let valid = signatures
        .iter()
        .any(|sig| sig.as_bytes().ct_eq(expected.as_bytes()).into());

    if !valid {
        tracing::warn!("Webhook signature mismatch");
        return Err(AppError::BadRequest("Invalid signature".to_string()));
    }

    Ok(())
}
