//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory. In production the
//! deployment platform injects secrets as environment variables, so no
//! separate secret-manager client is needed.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and checkout redirects
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Google OAuth client ID (audience for sign-in ID tokens)
    pub google_client_id: String,
    /// OpenRouteService endpoint base
    pub ors_base_url: String,
    /// Stripe price ID for the premium subscription
    pub stripe_premium_price_id: String,
    /// Stripe price ID for the one-off checkout test product
    pub stripe_test_price_id: String,

    // --- Secrets (cached from env) ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// OpenRouteService API key (bearer token)
    pub ors_api_key: String,
    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            ors_base_url: "https://api.openrouteservice.org".to_string(),
            stripe_premium_price_id: "price_test_premium".to_string(),
            stripe_test_price_id: "price_test_low".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            ors_api_key: "test_ors_key".to_string(),
            stripe_secret_key: "sk_test_key".to_string(),
            stripe_webhook_secret: "whsec_test".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            ors_base_url: env::var("ORS_BASE_URL")
                .unwrap_or_else(|_| "https://api.openrouteservice.org".to_string()),
            stripe_premium_price_id: env::var("STRIPE_PREMIUM_PRICE_ID")
                .map_err(|_| ConfigError::Missing("STRIPE_PREMIUM_PRICE_ID"))?,
            stripe_test_price_id: env::var("STRIPE_TEST_PRICE_ID")
                .map_err(|_| ConfigError::Missing("STRIPE_TEST_PRICE_ID"))?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            ors_api_key: env::var("ORS_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ORS_API_KEY"))?,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
