use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{LatLng, TravelEstimate},
    services::travel::TravelEstimator,
    store::json_file,
};

/// Persisted form of a travel estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelCacheEntry {
    #[serde(default)]
    pub travel_time_minutes: Option<u32>,
    #[serde(default)]
    pub travel_cost_yen: Option<u32>,
    #[serde(default)]
    pub travel_summary: String,
    /// ISO 8601 timestamp with offset; absent or unparseable means invalid
    #[serde(default)]
    pub cached_at: Option<String>,
}

impl TravelCacheEntry {
    pub fn new(estimate: &TravelEstimate, cached_at: DateTime<FixedOffset>) -> Self {
        Self {
            travel_time_minutes: estimate.time_minutes,
            travel_cost_yen: estimate.cost_yen,
            travel_summary: estimate.summary.clone(),
            cached_at: Some(cached_at.to_rfc3339()),
        }
    }

    pub fn cached_at(&self) -> Option<DateTime<FixedOffset>> {
        self.cached_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
    }

    /// Usable iff younger than `expiry_days` and carrying a travel time
    ///
    /// Null-time entries record a failed estimate and are always retried.
    pub fn is_valid_at(&self, expiry_days: i64, now: DateTime<Utc>) -> bool {
        if self.travel_time_minutes.is_none() {
            return false;
        }
        let Some(cached_at) = self.cached_at() else {
            return false;
        };
        let age = now.signed_duration_since(cached_at);
        // Expiry too large to represent never expires
        Duration::try_days(expiry_days).map_or(true, |max_age| age < max_age)
    }

    pub fn to_estimate(&self) -> TravelEstimate {
        TravelEstimate {
            time_minutes: self.travel_time_minutes,
            cost_yen: self.travel_cost_yen,
            summary: self.travel_summary.clone(),
            computed_at: self
                .cached_at()
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Checks an entry against the current time
pub fn valid(entry: &TravelCacheEntry, expiry_days: i64) -> bool {
    entry.is_valid_at(expiry_days, Utc::now())
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub estimate: TravelEstimate,
    /// False when the estimator had to run (and the store was rewritten)
    pub hit: bool,
}

/// File-backed travel estimates keyed by destination id
///
/// Entries are never evicted; the store grows by one entry per new destination.
pub struct TravelCache {
    path: PathBuf,
    entries: BTreeMap<String, TravelCacheEntry>,
    estimator: TravelEstimator,
    offset: FixedOffset,
}

impl TravelCache {
    /// Loads the store at `path`; a missing or malformed file yields an empty cache
    pub fn open(path: impl Into<PathBuf>, estimator: TravelEstimator, offset: FixedOffset) -> Self {
        let path = path.into();
        let entries: BTreeMap<String, TravelCacheEntry> = json_file::load_or_default(&path);
        tracing::info!(path = %path.display(), entries = entries.len(), "Travel cache loaded");
        Self {
            path,
            entries,
            estimator,
            offset,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, destination_id: &str) -> Option<&TravelCacheEntry> {
        self.entries.get(destination_id)
    }

    /// Returns a valid cached estimate, or computes, stores and persists a fresh one
    pub async fn get_or_compute(
        &mut self,
        destination_id: &str,
        origin: LatLng,
        destination: LatLng,
        expiry_days: i64,
    ) -> AppResult<TravelEstimate> {
        self.fetch(destination_id, origin, destination, expiry_days)
            .await
            .map(|lookup| lookup.estimate)
    }

    /// Like [`get_or_compute`](Self::get_or_compute) but reports whether it was a hit
    pub async fn fetch(
        &mut self,
        destination_id: &str,
        origin: LatLng,
        destination: LatLng,
        expiry_days: i64,
    ) -> AppResult<CacheLookup> {
        self.fetch_at(destination_id, origin, destination, expiry_days, Utc::now())
            .await
    }

    pub async fn fetch_at(
        &mut self,
        destination_id: &str,
        origin: LatLng,
        destination: LatLng,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CacheLookup> {
        if let Some(entry) = self.entries.get(destination_id) {
            if entry.is_valid_at(expiry_days, now) {
                tracing::debug!(destination_id = %destination_id, "Travel cache hit");
                return Ok(CacheLookup {
                    estimate: entry.to_estimate(),
                    hit: true,
                });
            }
        }

        tracing::info!(destination_id = %destination_id, "Travel cache miss, estimating");
        let estimate = self.estimator.estimate(origin, destination).await?;

        let entry = TravelCacheEntry::new(&estimate, now.with_timezone(&self.offset));
        self.entries.insert(destination_id.to_string(), entry);
        json_file::save(&self.path, &self.entries)?;

        Ok(CacheLookup {
            estimate,
            hit: false,
        })
    }
}
