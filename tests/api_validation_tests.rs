// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout creation validation tests.
//!
//! All of these requests carry a valid session token and fail input
//! validation, so they must come back as 400s before any database or
//! directions call is made (the offline mock would turn those into 500s).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn valid_body() -> Value {
    json!({
        "name": "Corrida no Parque",
        "activity_type": "Corrida",
        "pace_min": "6:30",
        "pace_max": "5:00",
        "city": "Curitiba",
        "date": "2026-09-15",
        "time": "07:00",
        "route": [
            { "lat": -25.4284, "lng": -49.2733 },
            { "lat": -25.4310, "lng": -49.2760 }
        ],
        "is_private": false
    })
}

async fn post_workout(body: Value) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("runner-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workouts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    response.status()
}

#[tokio::test]
async fn test_create_workout_rejects_blank_name() {
    let mut body = valid_body();
    body["name"] = json!("   ");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_malformed_pace() {
    let mut body = valid_body();
    body["pace_min"] = json!("6:75");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);

    let mut body = valid_body();
    body["pace_max"] = json!("fast");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_inverted_pace_range() {
    let mut body = valid_body();
    // min must be the slower bound
    body["pace_min"] = json!("5:00");
    body["pace_max"] = json!("6:30");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_unsupported_city() {
    let mut body = valid_body();
    body["city"] = json!("Springfield");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_bad_date_and_time() {
    let mut body = valid_body();
    body["date"] = json!("15/09/2026");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);

    let mut body = valid_body();
    body["time"] = json!("7h00");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_empty_route() {
    let mut body = valid_body();
    body["route"] = json!([]);
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_rejects_out_of_range_coordinates() {
    let mut body = valid_body();
    body["route"] = json!([
        { "lat": -25.4284, "lng": -49.2733 },
        { "lat": 95.0, "lng": -49.2760 }
    ]);
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_single_point_requires_manual_distance() {
    let mut body = valid_body();
    body["route"] = json!([{ "lat": -25.4284, "lng": -49.2733 }]);
    assert_eq!(post_workout(body.clone()).await, StatusCode::BAD_REQUEST);

    body["manual_distance_km"] = json!(-2.0);
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_private_workout_requires_passphrase() {
    let mut body = valid_body();
    body["is_private"] = json!(true);
    assert_eq!(post_workout(body.clone()).await, StatusCode::BAD_REQUEST);

    body["passphrase"] = json!("   ");
    assert_eq!(post_workout(body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_message_rejects_blank_text() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("runner-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workouts/w1/messages")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "text": "   " }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_route_preview_rejects_bad_coordinates() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("runner-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/routes/preview")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "points": [{ "lat": 0.0, "lng": 200.0 }] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
