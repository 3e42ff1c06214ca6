// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout listing filter.
//!
//! The directory subscribes to the full workout collection and narrows it
//! client-side; this module is that narrowing, applied server-side to the
//! ordered query results. All criteria are conjunctive.

use crate::models::Workout;
use serde::Deserialize;

/// Public/private visibility criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityFilter {
    #[default]
    All,
    PublicOnly,
    PrivateOnly,
}

/// Client-held filter criteria for a listing view.
#[derive(Debug, Clone, Default)]
pub struct WorkoutFilter {
    /// City equality
    pub city: Option<String>,
    /// Substring of the pace range label (case-insensitive)
    pub pace: Option<String>,
    /// Visibility criterion
    pub visibility: VisibilityFilter,
    /// Substring of the name (case-insensitive)
    pub name: Option<String>,
}

impl WorkoutFilter {
    /// Whether a workout may appear in a listing at all: it needs a
    /// non-whitespace name and at least `min_route_points` route points.
    pub fn is_listable(workout: &Workout, min_route_points: usize) -> bool {
        !workout.name.trim().is_empty() && workout.route.len() >= min_route_points
    }

    /// Whether the workout matches every set criterion.
    pub fn matches(&self, workout: &Workout) -> bool {
        if let Some(city) = &self.city {
            if &workout.city != city {
                return false;
            }
        }

        if let Some(pace) = &self.pace {
            if !workout
                .pace_label()
                .to_lowercase()
                .contains(&pace.to_lowercase())
            {
                return false;
            }
        }

        match self.visibility {
            VisibilityFilter::All => {}
            VisibilityFilter::PublicOnly if workout.is_private => return false,
            VisibilityFilter::PrivateOnly if !workout.is_private => return false,
            _ => {}
        }

        if let Some(name) = &self.name {
            if !workout.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        true
    }

    /// Apply listability plus all criteria, preserving input order.
    pub fn apply(&self, workouts: Vec<Workout>, min_route_points: usize) -> Vec<Workout> {
        workouts
            .into_iter()
            .filter(|w| Self::is_listable(w, min_route_points) && self.matches(w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutePoint;

    fn workout(name: &str, city: &str, points: usize, private: bool) -> Workout {
        Workout {
            id: "w1".to_string(),
            name: name.to_string(),
            activity_type: "Corrida".to_string(),
            pace_min: "6:00".to_string(),
            pace_max: "5:00".to_string(),
            city: city.to_string(),
            date: "2026-09-01".to_string(),
            time: "07:00".to_string(),
            route: vec![RoutePoint { lat: -27.59, lng: -48.54 }; points],
            distance_km: 5.0,
            is_private: private,
            passphrase_hash: None,
            creator_id: "u1".to_string(),
            created_at: "2026-08-30T10:00:00Z".to_string(),
            participants: vec!["u1".to_string()],
        }
    }

    #[test]
    fn test_empty_name_never_listed() {
        let filter = WorkoutFilter::default();
        let out = filter.apply(vec![workout("   ", "Curitiba", 3, false)], 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_min_route_points_per_view() {
        let single = workout("Treino", "Curitiba", 1, false);
        assert!(WorkoutFilter::is_listable(&single, 1));
        assert!(!WorkoutFilter::is_listable(&single, 2));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filter = WorkoutFilter {
            city: Some("Curitiba".to_string()),
            pace: Some("5:0".to_string()),
            visibility: VisibilityFilter::PublicOnly,
            name: Some("manhã".to_string()),
        };

        let matching = workout("Corrida da Manhã", "Curitiba", 2, false);
        assert!(filter.matches(&matching));

        let wrong_city = workout("Corrida da Manhã", "Recife", 2, false);
        assert!(!filter.matches(&wrong_city));

        let private = workout("Corrida da Manhã", "Curitiba", 2, true);
        assert!(!filter.matches(&private));
    }

    #[test]
    fn test_name_filter_case_insensitive() {
        let filter = WorkoutFilter {
            name: Some("LONGÃO".to_lowercase()),
            ..Default::default()
        };
        assert!(filter.matches(&workout("Longão de domingo", "Manaus", 2, false)));
    }

    #[test]
    fn test_visibility_private_only() {
        let filter = WorkoutFilter {
            visibility: VisibilityFilter::PrivateOnly,
            ..Default::default()
        };
        assert!(filter.matches(&workout("Treino", "Recife", 2, true)));
        assert!(!filter.matches(&workout("Treino", "Recife", 2, false)));
    }
}
