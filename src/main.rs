// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PaceMatch API Server
//!
//! Serves the workout directory, participation, chat, and billing endpoints
//! backed by Firestore, with Google sign-in sessions and Stripe checkout.

use pacematch::{
    config::Config,
    db::FirestoreDb,
    services::{CheckoutService, DirectionsService, FeedService, GoogleIdVerifier, QuotaService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting PaceMatch API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let directions = DirectionsService::new(&config.ors_base_url, &config.ors_api_key);
    tracing::info!(base_url = %config.ors_base_url, "Directions service initialized");

    let checkout = CheckoutService::new(
        config.stripe_secret_key.clone(),
        config.stripe_premium_price_id.clone(),
        config.stripe_test_price_id.clone(),
        config.frontend_url.clone(),
    );

    let quota = QuotaService::new(db.clone());
    let feed = FeedService::new();

    let identity_verifier = Arc::new(
        GoogleIdVerifier::new(&config.google_client_id)
            .expect("Failed to initialize identity verifier"),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        directions,
        checkout,
        quota,
        feed,
        identity_verifier,
    });

    // Build router
    let app = pacematch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacematch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
