// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participation state machine for (user, workout) pairs.
//!
//! Two states: not-participant and participant. Join is gated by the
//! monthly quota and, for private workouts, the passphrase; leave is always
//! permitted. Both directions are idempotent. The decisions here are pure;
//! the caller applies the resulting action as a server-side array transform,
//! so concurrent joins/leaves by different users cannot clobber each other.

use crate::error::{AppError, Result};
use crate::models::Workout;
use crate::services::passphrase::verify_passphrase;
use crate::services::quota::QuotaUsage;

/// Outcome of an authorized join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Append the user id to the participant set
    Joined,
    /// Already a member; nothing to write
    AlreadyParticipant,
}

/// Outcome of a leave attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Remove the user id from the participant set
    Left,
    /// Not a member; nothing to write
    NotParticipant,
}

/// Decide whether `user_id` may join `workout`.
///
/// Quota is checked by the caller beforehand (the usage is passed in so an
/// already-participant no-op never burns quota). Passphrase mismatches on
/// private workouts leave the participant set untouched.
pub fn authorize_join(
    workout: &Workout,
    user_id: &str,
    passphrase: Option<&str>,
    usage: &QuotaUsage,
) -> Result<JoinOutcome> {
    if workout.is_participant(user_id) {
        return Ok(JoinOutcome::AlreadyParticipant);
    }

    if usage.is_exhausted() {
        return Err(AppError::QuotaExceeded {
            used: usage.used,
            limit: usage.limit.unwrap_or(usage.used),
        });
    }

    if workout.is_private {
        let stored = workout
            .passphrase_hash
            .as_deref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!(
                "Private workout {} has no passphrase hash",
                workout.id
            )))?;

        match passphrase {
            Some(candidate) if verify_passphrase(candidate, stored) => {}
            _ => return Err(AppError::InvalidPassphrase),
        }
    }

    Ok(JoinOutcome::Joined)
}

/// Decide the effect of `user_id` leaving `workout`.
///
/// Always permitted; leaving while not a participant is a harmless no-op.
/// Creator privileges (delete) stay tied to the creator id regardless.
pub fn plan_leave(workout: &Workout, user_id: &str) -> LeaveOutcome {
    if workout.is_participant(user_id) {
        LeaveOutcome::Left
    } else {
        LeaveOutcome::NotParticipant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutePoint;
    use crate::services::passphrase::hash_passphrase;
    use crate::services::quota::FREE_TIER_MONTHLY_LIMIT;

    fn public_workout() -> Workout {
        Workout {
            id: "w1".to_string(),
            name: "Corrida da Manhã".to_string(),
            activity_type: "Corrida".to_string(),
            pace_min: "6:00".to_string(),
            pace_max: "5:00".to_string(),
            city: "Curitiba".to_string(),
            date: "2026-09-01".to_string(),
            time: "07:00".to_string(),
            route: vec![
                RoutePoint { lat: -25.43, lng: -49.27 },
                RoutePoint { lat: -25.44, lng: -49.28 },
            ],
            distance_km: 5.2,
            is_private: false,
            passphrase_hash: None,
            creator_id: "creator".to_string(),
            created_at: "2026-08-30T10:00:00Z".to_string(),
            participants: vec!["creator".to_string()],
        }
    }

    fn private_workout(passphrase: &str) -> Workout {
        Workout {
            is_private: true,
            passphrase_hash: Some(hash_passphrase(passphrase)),
            ..public_workout()
        }
    }

    fn usage(used: usize) -> QuotaUsage {
        QuotaUsage {
            used,
            limit: Some(FREE_TIER_MONTHLY_LIMIT),
        }
    }

    #[test]
    fn test_join_public_workout() {
        let outcome = authorize_join(&public_workout(), "runner", None, &usage(0)).unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
    }

    #[test]
    fn test_join_is_idempotent() {
        // Joining while already a participant never duplicates the id and
        // is decided before any gate (even with quota exhausted).
        let outcome =
            authorize_join(&public_workout(), "creator", None, &usage(3)).unwrap();
        assert_eq!(outcome, JoinOutcome::AlreadyParticipant);
    }

    #[test]
    fn test_join_blocked_at_quota() {
        let err = authorize_join(&public_workout(), "runner", None, &usage(3)).unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { used: 3, limit: 3 }));
    }

    #[test]
    fn test_join_private_wrong_passphrase() {
        let workout = private_workout("segredo");
        let err = authorize_join(&workout, "runner", Some("errado"), &usage(0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidPassphrase));
    }

    #[test]
    fn test_join_private_missing_passphrase() {
        let workout = private_workout("segredo");
        let err = authorize_join(&workout, "runner", None, &usage(0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidPassphrase));
    }

    #[test]
    fn test_join_private_correct_passphrase() {
        let workout = private_workout("segredo");
        let outcome =
            authorize_join(&workout, "runner", Some("segredo"), &usage(0)).unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
    }

    #[test]
    fn test_premium_bypasses_quota() {
        let outcome = authorize_join(
            &public_workout(),
            "runner",
            None,
            &QuotaUsage::unlimited(17),
        )
        .unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
    }

    #[test]
    fn test_leave_then_leave_again() {
        let mut workout = public_workout();
        workout.participants.push("runner".to_string());

        assert_eq!(plan_leave(&workout, "runner"), LeaveOutcome::Left);

        workout.participants.retain(|p| p != "runner");
        assert_eq!(plan_leave(&workout, "runner"), LeaveOutcome::NotParticipant);
    }

    #[test]
    fn test_creator_can_leave() {
        // Leaving does not touch creator privileges; delete stays keyed to
        // creator_id in the route handler.
        assert_eq!(plan_leave(&public_workout(), "creator"), LeaveOutcome::Left);
    }
}
