/// External collaborators of the weekly pipeline
///
/// Each concern (place search, routing, remote visit tracking, delivery of the
/// final selection) sits behind a trait so the pipeline can run against the
/// Google APIs in production and against in-memory fakes in tests.
use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{LatLng, PlaceDetails, RouteLeg, RouteMode, SearchPage, WeeklyRecommendation},
};

pub mod gmail;
pub mod google_places;
pub mod google_routes;
pub mod google_sheets;
pub mod site_data;

pub use gmail::GmailNotifier;
pub use google_places::GooglePlacesClient;
pub use google_routes::GoogleRoutesClient;
pub use google_sheets::GoogleSheetsClient;
pub use site_data::SiteDataPublisher;

/// Parameters of one text search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub origin: LatLng,
    pub radius_meters: u32,
    pub min_rating: f64,
}

/// Trait for place data providers
///
/// Search is cheap and paginated; details are expensive and are only requested
/// for the handful of restaurants that survive selection.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Fetch one page of results for `query`, continuing from `page_token` when given
    async fn search(&self, query: &SearchQuery, page_token: Option<String>) -> AppResult<SearchPage>;

    /// Fetch the full record for one place
    async fn get_details(&self, place_id: &str) -> AppResult<PlaceDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for routing oracles consumed by the travel estimator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RoutingOracle: Send + Sync {
    /// Returns `Ok(None)` when the oracle answered but found no usable route
    async fn compute_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: RouteMode,
    ) -> AppResult<Option<RouteLeg>>;
}

/// Remote store of restaurants the user has confirmed visiting
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VisitedSource: Send + Sync {
    async fn fetch_visited(&self) -> AppResult<HashSet<String>>;

    fn name(&self) -> &'static str;
}

/// Destination for the final weekly selection
///
/// Sink failures never roll back the run; the pipeline logs them and moves on.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationSink: Send + Sync {
    async fn deliver(&self, week: &WeeklyRecommendation) -> AppResult<()>;

    fn name(&self) -> &'static str;
}
