// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Domain models stored in Firestore and shaped for the API.

pub mod chat;
pub mod filter;
pub mod user;
pub mod workout;

pub use chat::ChatMessage;
pub use filter::{VisibilityFilter, WorkoutFilter};
pub use user::{Plan, User};
pub use workout::{validate_city, validate_pace_range, RoutePoint, Workout};
