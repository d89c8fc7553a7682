use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Travel mode requested from the routing oracle
///
/// Only driving is measured; walking and transit are derived locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteMode {
    Drive,
}

/// A measured route between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub duration_seconds: u64,
    pub distance_meters: u64,
}

impl RouteLeg {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters as f64 / 1000.0
    }
}

// ============================================================================
// Routes API Types
// ============================================================================

/// Response from `POST directions/v2:computeRoutes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRoutesResponse {
    #[serde(default)]
    pub routes: Vec<ApiRoute>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoute {
    /// Protobuf duration string such as "1200s"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub distance_meters: Option<u64>,
}

impl ApiRoute {
    pub fn into_leg(self) -> AppResult<RouteLeg> {
        let duration_seconds = match self.duration.as_deref() {
            Some(raw) => parse_duration_seconds(raw)?,
            None => 0,
        };
        Ok(RouteLeg {
            duration_seconds,
            distance_meters: self.distance_meters.unwrap_or(0),
        })
    }
}

/// Parses "1200s" (optionally with fractional seconds) into whole seconds
pub fn parse_duration_seconds(raw: &str) -> AppResult<u64> {
    let trimmed = raw.trim().trim_end_matches('s');
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| AppError::ExternalApi(format!("Unparseable route duration: {:?}", raw)))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AppError::ExternalApi(format!(
            "Invalid route duration: {:?}",
            raw
        )));
    }
    Ok(seconds.round() as u64)
}
