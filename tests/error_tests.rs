// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error-to-response mapping tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use pacematch::error::AppError;

async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_unauthorized_maps_to_401() {
    let (status, body) = response_parts(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_invalid_token_maps_to_401() {
    let (status, body) = response_parts(AppError::InvalidToken).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_not_found_maps_to_404() {
    let (status, body) = response_parts(AppError::NotFound("Workout w1 not found".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Workout w1 not found");
}

#[tokio::test]
async fn test_bad_request_maps_to_400() {
    let (status, body) = response_parts(AppError::BadRequest("bad pace".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_quota_exceeded_maps_to_403_policy_signal() {
    // Quota exhaustion is a policy outcome the client uses to drive the
    // upgrade prompt, not an authentication failure.
    let (status, body) = response_parts(AppError::QuotaExceeded { used: 3, limit: 3 }).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "quota_exceeded");
    assert_eq!(body["details"], "3 of 3 monthly workouts used");
}

#[tokio::test]
async fn test_invalid_passphrase_maps_to_403() {
    let (status, body) = response_parts(AppError::InvalidPassphrase).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid_passphrase");
}

#[tokio::test]
async fn test_upstream_errors_map_to_502() {
    let (status, body) = response_parts(AppError::Directions("timeout".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "directions_error");

    let (status, body) = response_parts(AppError::Billing("HTTP 500".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "billing_error");
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = response_parts(AppError::Database("connection string".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}
