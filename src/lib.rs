// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PaceMatch: find people who run at your pace
//!
//! This crate provides the backend API for scheduling group workouts with
//! map-drawn routes, pace-range matching, per-workout chat, and a monthly
//! free-tier quota with a premium upgrade path.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CheckoutService, DirectionsService, FeedService, GoogleIdVerifier, QuotaService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub directions: DirectionsService,
    pub checkout: CheckoutService,
    pub quota: QuotaService,
    pub feed: FeedService,
    pub identity_verifier: Arc<GoogleIdVerifier>,
}
