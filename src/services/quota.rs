// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly workout quota for free-tier accounts.
//!
//! Basic-plan users may create or join at most 3 distinct workouts per
//! calendar month. The count is derived on demand from two month-scoped
//! queries (created-by and joined-into) de-duplicated by workout id, never
//! persisted. The check is advisory: it reads, the caller writes, and a
//! concurrent pair of checks can both pass. That over-admission is an
//! accepted property of the soft cap.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::Plan;
use crate::time_utils::{format_utc_rfc3339, month_start};
use std::collections::HashSet;

/// Monthly cap for basic-plan accounts.
pub const FREE_TIER_MONTHLY_LIMIT: usize = 3;

/// Current month usage for a user.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct QuotaUsage {
    /// Distinct workouts created or joined this month
    pub used: usize,
    /// Cap, absent for premium accounts
    pub limit: Option<usize>,
}

impl QuotaUsage {
    /// Unlimited usage (premium plan).
    pub fn unlimited(used: usize) -> Self {
        Self { used, limit: None }
    }

    pub fn is_exhausted(&self) -> bool {
        match self.limit {
            Some(limit) => self.used >= limit,
            None => false,
        }
    }

    pub fn remaining(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }
}

/// Count distinct workout ids across the created and joined sets.
///
/// A creator is also a participant of their own workout, so the same id can
/// appear in both queries; the union must not double-count it.
pub fn distinct_usage<I, J>(created: I, joined: J) -> usize
where
    I: IntoIterator<Item = String>,
    J: IntoIterator<Item = String>,
{
    let mut ids: HashSet<String> = created.into_iter().collect();
    ids.extend(joined);
    ids.len()
}

/// Quota enforcement service.
#[derive(Clone)]
pub struct QuotaService {
    db: FirestoreDb,
}

impl QuotaService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Compute the user's usage for the current calendar month.
    ///
    /// Read-only. Premium plans still get a real count (the quota endpoint
    /// reports it) but no limit, so they are never exhausted.
    pub async fn current_usage(&self, user_id: &str, plan: Plan) -> Result<QuotaUsage> {
        let since = format_utc_rfc3339(month_start(chrono::Utc::now()));

        let created = self.db.workout_ids_created_since(user_id, &since).await?;
        let joined = self.db.workout_ids_joined_since(user_id, &since).await?;
        let used = distinct_usage(created, joined);

        let limit = if plan.is_premium() {
            None
        } else {
            Some(FREE_TIER_MONTHLY_LIMIT)
        };

        Ok(QuotaUsage { used, limit })
    }

    /// Check that the user may create or join one more workout this month.
    ///
    /// Returns the usage on success so handlers can report it.
    pub async fn check(&self, user_id: &str, plan: Plan) -> Result<QuotaUsage> {
        let usage = self.current_usage(user_id, plan).await?;

        if usage.is_exhausted() {
            tracing::info!(
                user_id,
                used = usage.used,
                "Monthly workout quota exhausted"
            );
            return Err(AppError::QuotaExceeded {
                used: usage.used,
                limit: FREE_TIER_MONTHLY_LIMIT,
            });
        }

        Ok(usage)
    }
}
