use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod budget;
pub mod places;
pub mod routes;

pub use budget::{BudgetTier, MealType, PriceLevel};
pub use places::{ApiPlace, PlaceDetails, SearchPage};
pub use routes::{RouteLeg, RouteMode};

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6},{:.6})", self.lat, self.lng)
    }
}

/// A restaurant returned by search, before details are fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub location: LatLng,
    #[serde(default)]
    pub price_level: PriceLevel,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub google_maps_url: Option<String>,
    #[serde(default)]
    pub primary_type: Option<String>,
}

impl Candidate {
    /// Minimal candidate; the remaining descriptive fields default to empty
    pub fn new(id: impl Into<String>, rating: Option<f64>, review_count: u32, location: LatLng) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            rating,
            review_count,
            location,
            price_level: PriceLevel::default(),
            address: None,
            google_maps_url: None,
            primary_type: None,
        }
    }
}

/// Estimated travel from the fixed origin to one destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    /// `None` when no estimate could be produced; such entries are always recomputed
    pub time_minutes: Option<u32>,
    /// `None` when the fare could not be estimated (straight-line fallback)
    pub cost_yen: Option<u32>,
    pub summary: String,
    pub computed_at: DateTime<Utc>,
}

/// One recommended restaurant, enriched with details and travel information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub place_id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub user_rating_count: u32,
    pub budget_tier: BudgetTier,
    /// Display label of `budget_tier`
    #[serde(default)]
    pub budget_label: String,
    pub price_range_lunch: String,
    pub price_range_dinner: String,
    pub address: String,
    pub travel_time_minutes: Option<u32>,
    pub travel_cost_yen: Option<u32>,
    pub travel_summary: String,
    pub reservable: Option<bool>,
    pub opening_hours: Vec<String>,
    pub google_maps_url: String,
    pub website: String,
    pub phone: String,
    pub primary_type: String,
    pub recommended_menu: Option<String>,
}

/// The full output of one weekly run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecommendation {
    pub generated_at: DateTime<FixedOffset>,
    pub week_label: String,
    pub restaurants: Vec<Recommendation>,
}

impl WeeklyRecommendation {
    pub fn new(generated_at: DateTime<FixedOffset>, restaurants: Vec<Recommendation>) -> Self {
        Self {
            week_label: week_label(&generated_at),
            generated_at,
            restaurants,
        }
    }

    /// Slim record kept in the long-lived history
    pub fn to_week_record(&self) -> WeekRecord {
        WeekRecord {
            generated_at: self.generated_at.to_rfc3339(),
            week_label: self.week_label.clone(),
            restaurants: self
                .restaurants
                .iter()
                .map(|r| RecommendedRef {
                    place_id: r.place_id.clone(),
                    name: r.name.clone(),
                    rating: r.rating,
                })
                .collect(),
        }
    }
}

const WEEKDAYS_JA: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

/// Label for the week a run was generated in, e.g. "2026年10月16日（金）"
///
/// Matches the labels already present in history written by earlier runs.
pub fn week_label(generated_at: &DateTime<FixedOffset>) -> String {
    let weekday = WEEKDAYS_JA[generated_at.weekday().num_days_from_monday() as usize];
    format!(
        "{}年{}月{}日（{}）",
        generated_at.year(),
        generated_at.month(),
        generated_at.day(),
        weekday
    )
}

// ============================================================================
// Persisted history types
// ============================================================================

/// A past weekly recommendation as stored in history.json
///
/// `generated_at` is kept as the raw string so that a single malformed record
/// is skipped instead of invalidating the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub generated_at: String,
    #[serde(default)]
    pub week_label: String,
    #[serde(default)]
    pub restaurants: Vec<RecommendedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedRef {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
}
