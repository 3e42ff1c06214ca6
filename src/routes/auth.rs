// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication routes.
//!
//! Sessions are minted from a Google ID token: the client completes the
//! Google sign-in flow, posts the ID token here, and gets back an HttpOnly
//! session cookie plus its profile.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::User;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub id_token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

/// Exchange a Google ID token for a session.
///
/// Creates the user profile on first sign-in; on subsequent sign-ins the
/// Google-provided fields are refreshed but `plan` and `created_at` are
/// preserved.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SessionRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state.identity_verifier.verify_id_token(&body.id_token).await?;

    let now = format_utc_rfc3339(chrono::Utc::now());

    let user = match state.db.get_user(&identity.subject).await? {
        Some(mut existing) => {
            if let Some(name) = identity.name {
                existing.display_name = name;
            }
            if let Some(email) = identity.email {
                existing.email = Some(email);
            }
            if let Some(picture) = identity.picture {
                existing.avatar_url = Some(picture);
            }
            existing.last_active = now;
            existing
        }
        None => User {
            id: identity.subject.clone(),
            display_name: identity.name.unwrap_or_else(|| "Runner".to_string()),
            email: identity.email,
            avatar_url: identity.picture,
            plan: Default::default(),
            created_at: now.clone(),
            last_active: now,
        },
    };

    state.db.upsert_user(&user).await?;

    let jwt = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "Session created");

    // Expiry is enforced by the JWT itself, so a session-lifetime cookie
    // is enough here.
    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(SessionResponse { token: jwt, user }),
    ))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/");

    (
        jar.remove(removal),
        Json(serde_json::json!({ "status": "logged_out" })),
    )
}
