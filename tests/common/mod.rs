// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use pacematch::config::Config;
use pacematch::db::FirestoreDb;
use pacematch::routes::create_router;
use pacematch::services::{
    CheckoutService, DirectionsService, FeedService, GoogleIdVerifier, QuotaService,
};
use pacematch::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();

    let directions = DirectionsService::new(&config.ors_base_url, &config.ors_api_key);
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

    let state = Arc::new(AppState {
        config,
        db,
        directions,
        checkout,
        quota,
        feed,
        identity_verifier,
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT for the given user, signed with the test config key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    pacematch::middleware::auth::create_jwt(user_id, signing_key).unwrap()
}
