// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route resolution: OpenRouteService directions with a local great-circle
//! fallback.
//!
//! Full-route mode posts the ordered coordinates to the directions API and
//! adopts the returned path geometry and distance. Any failure (network,
//! non-2xx, malformed body) degrades silently to summing haversine
//! distances over the raw points; the caller keeps the straight-line path.

use crate::error::{AppError, Result};
use crate::models::RoutePoint;
use serde::Serialize;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Where a resolved route's geometry and distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteSource {
    /// Snapped path and distance from the directions API
    Directions,
    /// Raw points with summed great-circle distances
    StraightLine,
    /// Single start point with a user-declared distance
    Manual,
}

/// A route ready to persist: path geometry plus distance.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRoute {
    pub path: Vec<RoutePoint>,
    pub distance_km: f64,
    pub source: RouteSource,
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: RoutePoint, b: RoutePoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of great-circle distances over consecutive points, in kilometers.
pub fn path_distance_km(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// OpenRouteService directions client.
#[derive(Clone)]
pub struct DirectionsService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    profile: String,
}

impl DirectionsService {
    /// Create a client for the foot-walking directions profile.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            profile: "foot-walking".to_string(),
        }
    }

    /// Resolve a point set into a path and distance.
    ///
    /// Must be called whenever the point set changes so a stale distance is
    /// never kept. Fewer than 2 points cannot be resolved here (single-point
    /// mode carries a manual distance instead).
    pub async fn resolve(&self, points: &[RoutePoint]) -> Result<ResolvedRoute> {
        if points.len() < 2 {
            return Err(AppError::Directions(
                "A route needs at least 2 points".to_string(),
            ));
        }

        match self.fetch_directions(points).await {
            Ok(resolved) => Ok(resolved),
            Err(e) => {
                // Degrade to the local approximation; the user sees the raw
                // polyline and the straight-line distance, not an error.
                tracing::warn!(error = %e, "Directions API failed, using haversine fallback");
                Ok(ResolvedRoute {
                    path: points.to_vec(),
                    distance_km: path_distance_km(points),
                    source: RouteSource::StraightLine,
                })
            }
        }
    }

    /// Call the directions API and parse its GeoJSON response.
    async fn fetch_directions(&self, points: &[RoutePoint]) -> Result<ResolvedRoute> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.base_url, self.profile
        );

        // ORS expects [lng, lat] pairs
        let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.lng, p.lat]).collect();
        let body = serde_json::json!({ "coordinates": coordinates });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Directions(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Directions(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Directions(e.to_string()))?;

        parse_directions_response(&body)
    }
}

/// Extract path geometry and summary distance from an ORS GeoJSON body.
fn parse_directions_response(body: &str) -> Result<ResolvedRoute> {
    let collection: geojson::FeatureCollection = body
        .parse()
        .map_err(|e| AppError::Directions(format!("GeoJSON parse error: {}", e)))?;

    let feature = collection
        .features
        .first()
        .ok_or_else(|| AppError::Directions("Empty feature collection".to_string()))?;

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| AppError::Directions("Feature has no geometry".to_string()))?;

    let path = match &geometry.value {
        geojson::Value::LineString(coords) => coords
            .iter()
            .map(|c| RoutePoint { lng: c[0], lat: c[1] })
            .collect::<Vec<_>>(),
        other => {
            return Err(AppError::Directions(format!(
                "Unexpected geometry type: {}",
                other.type_name()
            )))
        }
    };

    let distance_meters = feature
        .property("summary")
        .and_then(|summary| summary.get("distance"))
        .and_then(|d| d.as_f64())
        .ok_or_else(|| AppError::Directions("Missing summary distance".to_string()))?;

    Ok(ResolvedRoute {
        path,
        distance_km: distance_meters / 1000.0,
        source: RouteSource::Directions,
    })
}
