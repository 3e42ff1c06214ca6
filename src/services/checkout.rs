// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stripe Checkout bridge.
//!
//! Creates hosted checkout sessions server-side and hands the redirect URL
//! back to the browser. Two fixed prices exist: the premium subscription
//! and a low-value one-off product used to exercise the integration.

use crate::error::{AppError, Result};
use serde::Deserialize;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the browser navigates to
    pub url: String,
}

/// Stripe Checkout client.
#[derive(Clone)]
pub struct CheckoutService {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    premium_price_id: String,
    test_price_id: String,
    frontend_url: String,
}

impl CheckoutService {
    pub fn new(
        secret_key: String,
        premium_price_id: String,
        test_price_id: String,
        frontend_url: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: STRIPE_API_BASE.to_string(),
            secret_key,
            premium_price_id,
            test_price_id,
            frontend_url,
        }
    }

    /// Create a subscription checkout session for the premium plan.
    ///
    /// `user_id` travels as `client_reference_id` so the completion webhook
    /// can upgrade the right account.
    pub async fn create_premium_session(&self, user_id: &str) -> Result<CheckoutSession> {
        self.create_session(&self.premium_price_id, "subscription", user_id)
            .await
    }

    /// Create a one-off payment session for the checkout test product.
    pub async fn create_test_session(&self, user_id: &str) -> Result<CheckoutSession> {
        self.create_session(&self.test_price_id, "payment", user_id)
            .await
    }

    async fn create_session(
        &self,
        price_id: &str,
        mode: &str,
        user_id: &str,
    ) -> Result<CheckoutSession> {
        let url = format!("{}/checkout/sessions", self.base_url);
        let success_url = format!("{}/success", self.frontend_url);
        let cancel_url = format!("{}/cancel", self.frontend_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("mode", mode),
                ("payment_method_types[0]", "card"),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("client_reference_id", user_id),
                ("success_url", success_url.as_str()),
                ("cancel_url", cancel_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Billing(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Checkout session creation failed");
            return Err(AppError::Billing(format!("HTTP {}: {}", status, body)));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| AppError::Billing(format!("JSON parse error: {}", e)))?;

        tracing::info!(session_id = %session.id, mode, "Checkout session created");

        Ok(session)
    }
}
