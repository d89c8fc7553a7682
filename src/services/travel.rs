use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{LatLng, RouteLeg, RouteMode, TravelEstimate},
    services::{geo::distance_between, providers::RoutingOracle},
};

/// Destinations at or below this straight-line distance are reached on foot
pub const WALKING_THRESHOLD_KM: f64 = 1.5;
/// 4.8 km/h
pub const WALKING_SPEED_KM_PER_MIN: f64 = 0.08;
/// Transit time approximated from the driving time; the oracle's own transit
/// mode returns no routes in this market
pub const TRANSIT_MULTIPLIER: f64 = 1.5;
/// Straight-line fallback pace when the oracle finds no route
pub const FALLBACK_MINUTES_PER_KM: f64 = 3.0;

/// Converts an origin/destination pair into a travel time and fare estimate
#[derive(Clone)]
pub struct TravelEstimator {
    oracle: Arc<dyn RoutingOracle>,
}

impl TravelEstimator {
    pub fn new(oracle: Arc<dyn RoutingOracle>) -> Self {
        Self { oracle }
    }

    /// Estimates travel from `origin` to `destination`
    ///
    /// Short hops are walked without calling the oracle. Longer trips use the
    /// oracle's driving route scaled to transit time, or a straight-line guess
    /// when the oracle has no route. Oracle failures are returned to the caller.
    pub async fn estimate(&self, origin: LatLng, destination: LatLng) -> AppResult<TravelEstimate> {
        let distance_km = distance_between(origin, destination);

        if distance_km <= WALKING_THRESHOLD_KM {
            let minutes = walking_minutes(distance_km);
            return Ok(TravelEstimate {
                time_minutes: Some(minutes),
                cost_yen: Some(0),
                summary: format!("Walk {} min", minutes),
                computed_at: Utc::now(),
            });
        }

        let route = self
            .oracle
            .compute_route(origin, destination, RouteMode::Drive)
            .await?;

        let estimate = match route {
            Some(leg) => transit_estimate(leg),
            None => {
                let minutes = straight_line_minutes(distance_km);
                tracing::debug!(
                    destination = %destination,
                    distance_km = distance_km,
                    "No route returned, using straight-line estimate"
                );
                TravelEstimate {
                    time_minutes: Some(minutes),
                    cost_yen: None,
                    summary: format!(
                        "Estimated {} min (straight line {:.1} km)",
                        minutes, distance_km
                    ),
                    computed_at: Utc::now(),
                }
            }
        };

        Ok(estimate)
    }
}

fn transit_estimate(leg: RouteLeg) -> TravelEstimate {
    let minutes = transit_minutes(leg.duration_seconds);
    let road_km = leg.distance_km();
    TravelEstimate {
        time_minutes: Some(minutes),
        cost_yen: Some(estimate_fare_yen(road_km)),
        summary: format!("Transit approx. {} min ({:.0} km)", minutes, road_km),
        computed_at: Utc::now(),
    }
}

pub fn walking_minutes(distance_km: f64) -> u32 {
    (distance_km / WALKING_SPEED_KM_PER_MIN).round() as u32
}

pub fn transit_minutes(drive_seconds: u64) -> u32 {
    (drive_seconds as f64 / 60.0 * TRANSIT_MULTIPLIER).round() as u32
}

pub fn straight_line_minutes(distance_km: f64) -> u32 {
    (distance_km * FALLBACK_MINUTES_PER_KM).round() as u32
}

/// Distance-based train fare, rounded to the nearest 10 yen
pub fn estimate_fare_yen(road_km: f64) -> u32 {
    let raw = if road_km <= 5.0 {
        180.0
    } else if road_km <= 15.0 {
        150.0 + 15.0 * road_km
    } else if road_km <= 30.0 {
        200.0 + 12.0 * road_km
    } else {
        250.0 + 10.0 * road_km
    };
    ((raw / 10.0).round() * 10.0) as u32
}
