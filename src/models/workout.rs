// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout model: a scheduled group activity with a route, time, and
//! participant roster.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Cities the directory currently supports.
pub const SUPPORTED_CITIES: &[&str] = &[
    "São Paulo",
    "Rio de Janeiro",
    "Belo Horizonte",
    "Curitiba",
    "Porto Alegre",
    "Brasília",
    "Recife",
    "Fortaleza",
    "Salvador",
    "Manaus",
    "Florianópolis e região",
];

/// A geographic point on a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
}

impl RoutePoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Workout record stored in Firestore.
///
/// The document ID is Firestore-generated; it is surfaced on reads via the
/// `_firestore_id` alias and never written back as a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Document ID (populated on reads, not persisted as a field; empty
    /// until the insert assigns one, so it is skipped when empty)
    #[serde(alias = "_firestore_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Workout name/title
    pub name: String,
    /// Activity type (Corrida, Caminhada, Trail, ...)
    pub activity_type: String,
    /// Slowest acceptable pace, "mm:ss" per km
    pub pace_min: String,
    /// Fastest acceptable pace, "mm:ss" per km
    pub pace_max: String,
    /// City (one of [`SUPPORTED_CITIES`])
    pub city: String,
    /// Date, ISO `YYYY-MM-DD`
    pub date: String,
    /// Time of day, `HH:MM`
    pub time: String,
    /// Ordered route points; a single point means start-only mode
    pub route: Vec<RoutePoint>,
    /// Derived distance in kilometers
    pub distance_km: f64,
    /// Whether joining requires the passphrase
    pub is_private: bool,
    /// SHA-256 hex digest of the passphrase (private workouts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_hash: Option<String>,
    /// Creator's user ID
    pub creator_id: String,
    /// Creation timestamp (RFC3339; orders the directory listing)
    pub created_at: String,
    /// Participant user IDs (creator is a member from creation)
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Workout {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }

    /// Pace range as displayed and matched by the listing filter.
    pub fn pace_label(&self) -> String {
        format!("{} - {}", self.pace_min, self.pace_max)
    }
}

/// Parse a pace token (`m:ss` or `mm:ss`) into total seconds per km.
pub fn parse_pace_token(token: &str) -> Result<u32, AppError> {
    let invalid =
        || AppError::BadRequest(format!("Invalid pace '{}': expected mm:ss", token));

    let (minutes, seconds) = token.split_once(':').ok_or_else(invalid)?;
    if minutes.is_empty() || minutes.len() > 2 || seconds.len() != 2 {
        return Err(invalid());
    }

    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
    if seconds >= 60 {
        return Err(invalid());
    }

    Ok(minutes * 60 + seconds)
}

/// Validate a pace range: both tokens well-formed and min (slower) >= max
/// (faster) in seconds, i.e. the range is not inverted.
pub fn validate_pace_range(pace_min: &str, pace_max: &str) -> Result<(), AppError> {
    let min_secs = parse_pace_token(pace_min)?;
    let max_secs = parse_pace_token(pace_max)?;
    if max_secs > min_secs {
        return Err(AppError::BadRequest(format!(
            "Pace range is inverted: {} is slower than {}",
            pace_max, pace_min
        )));
    }
    Ok(())
}

/// Check that the city is one the directory supports.
pub fn validate_city(city: &str) -> Result<(), AppError> {
    if SUPPORTED_CITIES.contains(&city) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unsupported city: {}", city)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pace_token() {
        assert_eq!(parse_pace_token("5:30").unwrap(), 330);
        assert_eq!(parse_pace_token("10:00").unwrap(), 600);
        assert!(parse_pace_token("5:60").is_err());
        assert!(parse_pace_token("5").is_err());
        assert!(parse_pace_token("5:3").is_err());
        assert!(parse_pace_token(":30").is_err());
        assert!(parse_pace_token("abc").is_err());
    }

    #[test]
    fn test_validate_pace_range() {
        // pace_min is the slower bound (more seconds per km)
        assert!(validate_pace_range("6:00", "5:00").is_ok());
        assert!(validate_pace_range("5:30", "5:30").is_ok());
        assert!(validate_pace_range("5:00", "6:00").is_err());
    }

    #[test]
    fn test_validate_city() {
        assert!(validate_city("Curitiba").is_ok());
        assert!(validate_city("Springfield").is_err());
    }

    #[test]
    fn test_route_point_bounds() {
        assert!(RoutePoint { lat: -27.59, lng: -48.54 }.is_valid());
        assert!(!RoutePoint { lat: 91.0, lng: 0.0 }.is_valid());
        assert!(!RoutePoint { lat: 0.0, lng: -181.0 }.is_valid());
    }
}
