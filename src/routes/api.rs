// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    validate_city, validate_pace_range, ChatMessage, Plan, RoutePoint, User, VisibilityFilter,
    Workout, WorkoutFilter,
};
use crate::services::directions::{ResolvedRoute, RouteSource};
use crate::services::feed::WorkoutEvent;
use crate::services::participation::{authorize_join, plan_leave, JoinOutcome, LeaveOutcome};
use crate::services::passphrase::hash_passphrase;
use crate::services::quota::QuotaUsage;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use validator::Validate;

/// Cap on concurrent Firestore lookups when resolving participant profiles.
const MAX_CONCURRENT_DB_OPS: usize = 8;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/quota", get(get_quota))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route("/api/workouts/stream", get(stream_workouts))
        .route(
            "/api/workouts/{id}",
            get(get_workout).delete(delete_workout),
        )
        .route("/api/workouts/{id}/join", post(join_workout))
        .route("/api/workouts/{id}/leave", post(leave_workout))
        .route(
            "/api/workouts/{id}/messages",
            get(list_messages).post(post_message),
        )
        .route("/api/workouts/{id}/messages/stream", get(stream_messages))
        .route("/api/routes/preview", post(preview_route))
}

// ─── User Profile & Quota ────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile))
}

#[derive(Serialize)]
pub struct QuotaResponse {
    pub used: usize,
    /// None means unlimited (premium plan)
    pub limit: Option<usize>,
    pub remaining: Option<usize>,
}

impl From<QuotaUsage> for QuotaResponse {
    fn from(usage: QuotaUsage) -> Self {
        Self {
            used: usage.used,
            limit: usage.limit,
            remaining: usage.remaining(),
        }
    }
}

/// Current month's workout quota usage.
async fn get_quota(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<QuotaResponse>> {
    let plan = user_plan(&state, &user.user_id).await?;
    let usage = state.quota.current_usage(&user.user_id, plan).await?;
    Ok(Json(usage.into()))
}

async fn user_plan(state: &Arc<AppState>, user_id: &str) -> Result<Plan> {
    Ok(state
        .db
        .get_user(user_id)
        .await?
        .map(|u| u.plan)
        .unwrap_or_default())
}

// ─── Workout Directory ───────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct WorkoutListParams {
    #[serde(default)]
    pub city: Option<String>,
    /// Case-insensitive substring match against the "min - max" pace label
    #[serde(default)]
    pub pace: Option<String>,
    #[serde(default)]
    pub visibility: Option<VisibilityFilter>,
    #[serde(default)]
    pub name: Option<String>,
    /// Restrict to workouts the caller created or joined
    #[serde(default)]
    pub mine: Option<bool>,
    /// Compact listings accept single-point routes
    #[serde(default)]
    pub compact: Option<bool>,
}

#[derive(Serialize)]
pub struct WorkoutListResponse {
    pub workouts: Vec<Workout>,
    pub total: usize,
}

/// List workouts, newest first, with directory filters applied.
async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<WorkoutListParams>,
) -> Result<Json<WorkoutListResponse>> {
    let all = state.db.list_workouts().await?;

    let mine = params.mine.unwrap_or(false);
    let min_route_points = if params.compact.unwrap_or(false) { 1 } else { 2 };

    let filter = WorkoutFilter {
        city: params.city,
        pace: params.pace,
        visibility: params.visibility.unwrap_or_default(),
        name: params.name,
    };

    let mut workouts = filter.apply(all, min_route_points);
    if mine {
        workouts.retain(|w| w.is_creator(&user.user_id) || w.is_participant(&user.user_id));
    }

    let total = workouts.len();
    Ok(Json(WorkoutListResponse { workouts, total }))
}

// ─── Workout Creation ────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateWorkoutRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub activity_type: String,
    pub pace_min: String,
    pub pace_max: String,
    pub city: String,
    /// Scheduled date, `YYYY-MM-DD`
    pub date: String,
    /// Scheduled start time, `HH:MM`
    pub time: String,
    pub route: Vec<RoutePoint>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Required when the route is a single meeting point
    #[serde(default)]
    pub manual_distance_km: Option<f64>,
}

#[derive(Serialize)]
pub struct CreateWorkoutResponse {
    pub workout: Workout,
    pub route_source: RouteSource,
    pub quota: QuotaResponse,
}

/// Create a workout.
///
/// Routes with two or more points are resolved against the directions
/// backend (falling back to straight-line distance); a single meeting
/// point requires a manually entered distance.
async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateWorkoutRequest>,
) -> Result<Json<CreateWorkoutResponse>> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Workout name is required".to_string()));
    }

    validate_pace_range(&body.pace_min, &body.pace_max)?;
    validate_city(&body.city)?;

    chrono::NaiveDate::parse_from_str(&body.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", body.date)))?;
    chrono::NaiveTime::parse_from_str(&body.time, "%H:%M")
        .map_err(|_| AppError::BadRequest(format!("Invalid time: {}", body.time)))?;

    if body.route.is_empty() {
        return Err(AppError::BadRequest(
            "Route must have at least one point".to_string(),
        ));
    }
    if let Some(p) = body.route.iter().find(|p| !p.is_valid()) {
        return Err(AppError::BadRequest(format!(
            "Coordinate out of range: ({}, {})",
            p.lat, p.lng
        )));
    }

    // Single meeting point: distance cannot be derived from the map.
    if body.route.len() < 2 {
        match body.manual_distance_km {
            Some(d) if d.is_finite() && d > 0.0 => {}
            Some(_) => {
                return Err(AppError::BadRequest(
                    "manual_distance_km must be positive".to_string(),
                ))
            }
            None => {
                return Err(AppError::BadRequest(
                    "Single-point routes require manual_distance_km".to_string(),
                ))
            }
        }
    }

    let passphrase_hash = if body.is_private {
        let passphrase = body
            .passphrase
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Private workouts require a passphrase".to_string())
            })?;
        Some(hash_passphrase(passphrase))
    } else {
        None
    };

    // Quota is checked before any writes; premium plans skip it.
    let plan = user_plan(&state, &user.user_id).await?;
    state.quota.check(&user.user_id, plan).await?;

    let resolved = resolve_route(&state, &body).await?;

    let workout = Workout {
        id: String::new(),
        name: body.name.trim().to_string(),
        activity_type: body.activity_type,
        pace_min: body.pace_min,
        pace_max: body.pace_max,
        city: body.city,
        date: body.date,
        time: body.time,
        route: resolved.path,
        distance_km: resolved.distance_km,
        is_private: body.is_private,
        passphrase_hash,
        creator_id: user.user_id.clone(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
        participants: vec![user.user_id.clone()],
    };

    let created = state.db.create_workout(&workout).await?;

    tracing::info!(
        workout_id = %created.id,
        creator = %user.user_id,
        distance_km = created.distance_km,
        source = ?resolved.source,
        "Workout created"
    );

    state.feed.publish_workout(WorkoutEvent::Created {
        workout: created.clone(),
    });

    let usage = state.quota.current_usage(&user.user_id, plan).await?;

    Ok(Json(CreateWorkoutResponse {
        workout: created,
        route_source: resolved.source,
        quota: usage.into(),
    }))
}

async fn resolve_route(
    state: &Arc<AppState>,
    body: &CreateWorkoutRequest,
) -> Result<ResolvedRoute> {
    if body.route.len() >= 2 {
        return state.directions.resolve(&body.route).await;
    }

    // Single meeting point; the handler has already validated the manual
    // distance by this point.
    let distance_km = body.manual_distance_km.ok_or_else(|| {
        AppError::BadRequest("Single-point routes require manual_distance_km".to_string())
    })?;

    Ok(ResolvedRoute {
        path: body.route.clone(),
        distance_km,
        source: RouteSource::Manual,
    })
}

// ─── Workout Detail & Deletion ───────────────────────────────

#[derive(Serialize)]
pub struct ParticipantProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Serialize)]
pub struct WorkoutDetailResponse {
    #[serde(flatten)]
    pub workout: Workout,
    pub participant_profiles: Vec<ParticipantProfile>,
}

/// Get a single workout with resolved participant profiles.
async fn get_workout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetailResponse>> {
    let workout = state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    // Resolve participant ids to display profiles with bounded concurrency.
    let participant_profiles: Vec<ParticipantProfile> =
        futures_util::stream::iter(workout.participants.clone())
            .map(|participant_id| {
                let db = state.db.clone();
                async move {
                    match db.get_user(&participant_id).await {
                        Ok(Some(u)) => ParticipantProfile {
                            id: u.id,
                            display_name: u.display_name,
                            avatar_url: u.avatar_url,
                        },
                        Ok(None) => ParticipantProfile {
                            id: participant_id,
                            display_name: "Unknown".to_string(),
                            avatar_url: None,
                        },
                        Err(e) => {
                            tracing::warn!(error = %e, participant_id = %participant_id, "Failed to load participant profile");
                            ParticipantProfile {
                                id: participant_id,
                                display_name: "Unknown".to_string(),
                                avatar_url: None,
                            }
                        }
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

    Ok(Json(WorkoutDetailResponse {
        workout,
        participant_profiles,
    }))
}

#[derive(Serialize)]
pub struct DeleteWorkoutResponse {
    pub success: bool,
}

/// Delete a workout (creator only).
async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteWorkoutResponse>> {
    let workout = state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    if !workout.is_creator(&user.user_id) {
        return Err(AppError::Forbidden(
            "Only the creator can delete a workout".to_string(),
        ));
    }

    state.db.delete_workout(&id).await?;

    tracing::info!(workout_id = %id, creator = %user.user_id, "Workout deleted");

    state
        .feed
        .publish_workout(WorkoutEvent::Deleted { id: id.clone() });

    Ok(Json(DeleteWorkoutResponse { success: true }))
}

// ─── Participation ───────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct JoinRequest {
    #[serde(default)]
    pub passphrase: Option<String>,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub status: String,
    pub quota: QuotaResponse,
}

/// Join a workout.
///
/// Re-joining is a no-op and never burns quota; private workouts require
/// the correct passphrase.
async fn join_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<JoinRequest>>,
) -> Result<Json<JoinResponse>> {
    let Json(body) = body.unwrap_or_default();

    let workout = state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    let plan = user_plan(&state, &user.user_id).await?;
    let usage = state.quota.current_usage(&user.user_id, plan).await?;

    let outcome = authorize_join(&workout, &user.user_id, body.passphrase.as_deref(), &usage)?;

    let status = match outcome {
        JoinOutcome::AlreadyParticipant => "already_joined",
        JoinOutcome::Joined => {
            state.db.add_participant(&id, &user.user_id).await?;

            tracing::info!(workout_id = %id, user_id = %user.user_id, "User joined workout");

            let mut updated = workout.clone();
            updated.participants.push(user.user_id.clone());
            state
                .feed
                .publish_workout(WorkoutEvent::Updated { workout: updated });

            "joined"
        }
    };

    let usage = state.quota.current_usage(&user.user_id, plan).await?;

    Ok(Json(JoinResponse {
        status: status.to_string(),
        quota: usage.into(),
    }))
}

#[derive(Serialize)]
pub struct LeaveResponse {
    pub status: String,
}

/// Leave a workout. Leaving does not refund quota for the month.
async fn leave_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<LeaveResponse>> {
    let workout = state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    let status = match plan_leave(&workout, &user.user_id) {
        LeaveOutcome::NotParticipant => "not_joined",
        LeaveOutcome::Left => {
            state.db.remove_participant(&id, &user.user_id).await?;

            tracing::info!(workout_id = %id, user_id = %user.user_id, "User left workout");

            let mut updated = workout.clone();
            updated.participants.retain(|p| p != &user.user_id);
            state
                .feed
                .publish_workout(WorkoutEvent::Updated { workout: updated });

            "left"
        }
    };

    Ok(Json(LeaveResponse {
        status: status.to_string(),
    }))
}

// ─── Chat ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<ChatMessage>,
}

/// List a workout's chat messages in creation order.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageListResponse>> {
    // Workout existence is checked so a bad id is a 404, not an empty list.
    state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    let messages = state.db.list_messages(&id).await?;
    Ok(Json(MessageListResponse { messages }))
}

#[derive(Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

/// Post a chat message (participants only).
async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<ChatMessage>> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if body.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text is required".to_string()));
    }

    let workout = state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    if !workout.is_participant(&user.user_id) {
        return Err(AppError::Forbidden(
            "Only participants can post in the workout chat".to_string(),
        ));
    }

    let author = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let message = ChatMessage {
        id: String::new(),
        text: body.text.trim().to_string(),
        author_id: author.id,
        author_name: author.display_name,
        author_avatar: author.avatar_url,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let created = state.db.create_message(&id, &message).await?;

    state.feed.publish_chat(&id, created.clone());

    Ok(Json(created))
}

// ─── Live Streams (SSE) ──────────────────────────────────────

/// Stream workout directory changes as server-sent events.
async fn stream_workouts(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.feed.subscribe_workouts();
    Sse::new(broadcast_to_sse(rx, |event| {
        Event::default().event(event.kind()).json_data(&event)
    }))
    .keep_alive(KeepAlive::default())
}

/// Stream a workout's chat messages as server-sent events.
async fn stream_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    state
        .db
        .get_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))?;

    let rx = state.feed.subscribe_chat(&id);
    Ok(Sse::new(broadcast_to_sse(rx, |message| {
        Event::default().event("message").json_data(&message)
    }))
    .keep_alive(KeepAlive::default()))
}

/// Adapt a broadcast receiver into an SSE event stream.
///
/// Lagged receivers skip ahead rather than erroring; the stream ends when
/// the channel closes.
fn broadcast_to_sse<T, F>(
    rx: broadcast::Receiver<T>,
    to_event: F,
) -> impl Stream<Item = std::result::Result<Event, Infallible>>
where
    T: Clone + Send + 'static,
    F: Fn(T) -> std::result::Result<Event, axum::Error> + Send + 'static,
{
    futures_util::stream::unfold((rx, to_event), |(mut rx, to_event)| async move {
        loop {
            match rx.recv().await {
                Ok(item) => match to_event(item) {
                    Ok(event) => return Some((Ok(event), (rx, to_event))),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize SSE event");
                        continue;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged, skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

// ─── Route Preview ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct RoutePreviewRequest {
    pub points: Vec<RoutePoint>,
}

/// Resolve a drawn route into a path and distance without saving anything.
async fn preview_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RoutePreviewRequest>,
) -> Result<Json<ResolvedRoute>> {
    if let Some(p) = body.points.iter().find(|p| !p.is_valid()) {
        return Err(AppError::BadRequest(format!(
            "Coordinate out of range: ({}, {})",
            p.lat, p.lng
        )));
    }

    let resolved = state.directions.resolve(&body.points).await?;
    Ok(Json(resolved))
}
