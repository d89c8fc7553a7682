use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::LatLng;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Google Maps Platform API key (Places + Routes)
    pub google_api_key: String,

    /// Places API (New) base URL
    #[serde(default = "default_places_api_url")]
    pub places_api_url: String,

    /// Routes API computeRoutes endpoint
    #[serde(default = "default_routes_api_url")]
    pub routes_api_url: String,

    /// Sheets API base URL
    #[serde(default = "default_sheets_api_url")]
    pub sheets_api_url: String,

    /// Timeout applied to every outbound HTTP call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Latitude of the fixed origin (home / office)
    #[serde(default = "default_origin_lat")]
    pub origin_lat: f64,

    /// Longitude of the fixed origin
    #[serde(default = "default_origin_lng")]
    pub origin_lng: f64,

    /// Comma-separated text search queries
    #[serde(default = "default_search_queries")]
    pub search_queries: Vec<String>,

    #[serde(default = "default_search_radius_meters")]
    pub search_radius_meters: u32,

    #[serde(default = "default_min_rating")]
    pub min_rating: f64,

    #[serde(default = "default_max_pages_per_query")]
    pub max_pages_per_query: u32,

    #[serde(default = "default_min_reviews")]
    pub min_reviews: u32,

    #[serde(default = "default_max_travel_minutes")]
    pub max_travel_minutes: u32,

    /// Number of restaurants recommended per week
    #[serde(default = "default_pick_count")]
    pub pick_count: usize,

    /// Trailing window (weeks) during which a recommendation is not repeated
    #[serde(default = "default_recent_weeks")]
    pub recent_weeks: u32,

    #[serde(default = "default_travel_cache_expiry_days")]
    pub travel_cache_expiry_days: i64,

    /// Directory holding visited.json, history.json and travel_cache.json
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory the site data (current.json, archive.json) is published to
    #[serde(default = "default_site_data_dir")]
    pub site_data_dir: String,

    /// Spreadsheet tracking visits; remote sync is disabled when unset
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_worksheet_name")]
    pub worksheet_name: String,

    /// OAuth access token for the Sheets API, obtained out of band
    #[serde(default)]
    pub sheets_access_token: Option<String>,

    /// Gmail API base URL
    #[serde(default = "default_gmail_api_url")]
    pub gmail_api_url: String,

    /// OAuth access token with the gmail.send scope, obtained out of band
    #[serde(default)]
    pub gmail_access_token: Option<String>,

    /// Recipient of the weekly mail; mailing is disabled when unset
    #[serde(default)]
    pub email_recipient: Option<String>,

    #[serde(default)]
    pub email_sender: Option<String>,

    /// Subject line; `{date}` is replaced by the week label
    #[serde(default = "default_email_subject_template")]
    pub email_subject_template: String,

    /// Public URL of the recommendation site, linked from the mail
    #[serde(default)]
    pub site_base_url: Option<String>,

    /// Offset used for timestamps and week labels (hours east of UTC)
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Delay after each routing call that missed the cache
    #[serde(default = "default_routing_pace_ms")]
    pub routing_pace_ms: u64,

    #[serde(default = "default_details_pace_ms")]
    pub details_pace_ms: u64,

    #[serde(default = "default_page_pace_ms")]
    pub page_pace_ms: u64,

    #[serde(default = "default_query_pace_ms")]
    pub query_pace_ms: u64,
}

fn default_places_api_url() -> String {
    "https://places.googleapis.com/v1".to_string()
}

fn default_routes_api_url() -> String {
    "https://routes.googleapis.com/directions/v2:computeRoutes".to_string()
}

fn default_sheets_api_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_gmail_api_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_email_subject_template() -> String {
    "Weekly restaurant picks {date}".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_origin_lat() -> f64 {
    35.681236
}

fn default_origin_lng() -> f64 {
    139.767125
}

fn default_search_queries() -> Vec<String> {
    vec!["restaurant".to_string()]
}

fn default_search_radius_meters() -> u32 {
    30_000
}

fn default_min_rating() -> f64 {
    4.0
}

fn default_max_pages_per_query() -> u32 {
    3
}

fn default_min_reviews() -> u32 {
    50
}

fn default_max_travel_minutes() -> u32 {
    90
}

fn default_pick_count() -> usize {
    5
}

fn default_recent_weeks() -> u32 {
    4
}

fn default_travel_cache_expiry_days() -> i64 {
    90
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_site_data_dir() -> String {
    "site/data".to_string()
}

fn default_worksheet_name() -> String {
    "visited".to_string()
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_routing_pace_ms() -> u64 {
    200
}

fn default_details_pace_ms() -> u64 {
    300
}

fn default_page_pace_ms() -> u64 {
    500
}

fn default_query_pace_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from explicit key/value pairs
    pub fn from_pairs<I>(pairs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs)
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting and reports all problems at once
    pub fn validate(&self) -> AppResult<()> {
        let mut issues: Vec<String> = Vec::new();

        if self.google_api_key.trim().is_empty() {
            issues.push("GOOGLE_API_KEY must be set".into());
        }
        if !(-90.0..=90.0).contains(&self.origin_lat) {
            issues.push("ORIGIN_LAT must be within [-90, 90]".into());
        }
        if !(-180.0..=180.0).contains(&self.origin_lng) {
            issues.push("ORIGIN_LNG must be within [-180, 180]".into());
        }
        if self.search_queries.iter().all(|q| q.trim().is_empty()) {
            issues.push("SEARCH_QUERIES must contain at least one query".into());
        }
        if self.pick_count == 0 {
            issues.push("PICK_COUNT must be > 0".into());
        }
        if self.travel_cache_expiry_days <= 0 {
            issues.push("TRAVEL_CACHE_EXPIRY_DAYS must be > 0".into());
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            issues.push("UTC_OFFSET_HOURS must be within [-12, 14]".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(issues.join("; ")))
        }
    }

    pub fn origin(&self) -> LatLng {
        LatLng::new(self.origin_lat, self.origin_lng)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // validate() bounds the hours; unvalidated input falls back to UTC
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    pub fn visited_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("visited.json")
    }

    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("history.json")
    }

    pub fn travel_cache_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("travel_cache.json")
    }

    pub fn archive_path(&self) -> PathBuf {
        PathBuf::from(&self.site_data_dir).join("archive.json")
    }

    /// Remote visited tracking is enabled only with both a sheet and a token
    pub fn sheets_enabled(&self) -> bool {
        matches!(
            (&self.spreadsheet_id, &self.sheets_access_token),
            (Some(id), Some(token)) if !id.is_empty() && !token.is_empty()
        )
    }

    /// The weekly mail is sent only with both a recipient and a token
    pub fn email_enabled(&self) -> bool {
        matches!(
            (&self.email_recipient, &self.gmail_access_token),
            (Some(to), Some(token)) if !to.trim().is_empty() && !token.is_empty()
        )
    }
}
