// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod checkout;
pub mod directions;
pub mod feed;
pub mod google_identity;
pub mod participation;
pub mod passphrase;
pub mod quota;

pub use checkout::CheckoutService;
pub use directions::DirectionsService;
pub use feed::{FeedService, WorkoutEvent};
pub use google_identity::{GoogleIdVerifier, VerifiedIdentity};
pub use quota::QuotaService;
