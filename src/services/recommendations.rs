/// Weekly recommendation pipeline
///
/// One run searches the area around the origin, annotates every fresh
/// candidate with a (cached) travel estimate, filters and samples the pool,
/// enriches the picks with place details, records the week and hands the
/// result to every sink.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        Candidate, LatLng, PlaceDetails, Recommendation, TravelEstimate, WeeklyRecommendation,
    },
    services::{
        enrichment::build_recommendation,
        filter::{filter_candidates, FilterCriteria},
        pace,
        providers::{PlaceProvider, RecommendationSink},
        sampler,
        search::{search_all, SearchSettings},
    },
    store::{HistoryStore, TravelCache},
};

/// Tunables of one run, extracted from [`Config`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub origin: LatLng,
    pub queries: Vec<String>,
    pub search: SearchSettings,
    pub criteria: FilterCriteria,
    pub pick_count: usize,
    pub recent_weeks: u32,
    pub travel_cache_expiry_days: i64,
    pub routing_pace: Duration,
    pub details_pace: Duration,
    pub utc_offset: FixedOffset,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            origin: config.origin(),
            queries: config.search_queries.clone(),
            search: SearchSettings {
                origin: config.origin(),
                radius_meters: config.search_radius_meters,
                min_rating: config.min_rating,
                max_pages_per_query: config.max_pages_per_query,
                page_pace: Duration::from_millis(config.page_pace_ms),
                query_pace: Duration::from_millis(config.query_pace_ms),
            },
            criteria: FilterCriteria {
                min_reviews: config.min_reviews,
                max_travel_minutes: config.max_travel_minutes,
            },
            pick_count: config.pick_count,
            recent_weeks: config.recent_weeks,
            travel_cache_expiry_days: config.travel_cache_expiry_days,
            routing_pace: Duration::from_millis(config.routing_pace_ms),
            details_pace: Duration::from_millis(config.details_pace_ms),
            utc_offset: config.utc_offset(),
        }
    }
}

pub struct Recommender {
    places: Arc<dyn PlaceProvider>,
    travel_cache: TravelCache,
    history: HistoryStore,
    sinks: Vec<Arc<dyn RecommendationSink>>,
    settings: RunSettings,
}

impl Recommender {
    pub fn new(
        places: Arc<dyn PlaceProvider>,
        travel_cache: TravelCache,
        history: HistoryStore,
        settings: RunSettings,
    ) -> Self {
        Self {
            places,
            travel_cache,
            history,
            sinks: Vec::new(),
            settings,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn RecommendationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Runs the whole pipeline
    ///
    /// In dry-run mode the selection is built and returned but neither the
    /// history nor any sink is touched. Travel estimates are still cached.
    pub async fn run(&mut self, dry_run: bool) -> AppResult<WeeklyRecommendation> {
        self.run_at(Utc::now(), dry_run).await
    }

    pub async fn run_at(&mut self, now: DateTime<Utc>, dry_run: bool) -> AppResult<WeeklyRecommendation> {
        tracing::info!(
            provider = self.places.name(),
            queries = self.settings.queries.len(),
            pick_count = self.settings.pick_count,
            "Weekly run started"
        );

        // History
        let visited = self.history.load_visited().await;
        let recent = self.history.load_recent_at(self.settings.recent_weeks, now);

        // Search
        let candidates = search_all(
            self.places.as_ref(),
            &self.settings.queries,
            &self.settings.search,
        )
        .await;
        if candidates.is_empty() {
            return Err(AppError::NoCandidates);
        }

        // Travel
        let travel = self
            .annotate_travel(&candidates, &visited, &recent, now)
            .await;

        // Filter
        let filtered = filter_candidates(
            &candidates,
            &visited,
            &recent,
            self.settings.criteria,
            &travel,
        );
        if filtered.is_empty() {
            return Err(AppError::NoneAfterFiltering);
        }

        // Sample
        let selected = sampler::sample(&filtered, self.settings.pick_count);
        tracing::info!(
            pool = filtered.len(),
            selected = selected.len(),
            "Candidates sampled"
        );

        // Details
        let restaurants = self.enrich(&selected, &travel).await;
        let week = WeeklyRecommendation::new(now.with_timezone(&self.settings.utc_offset), restaurants);

        if dry_run {
            tracing::info!(
                restaurants = week.restaurants.len(),
                "Dry run, skipping history and delivery"
            );
            return Ok(week);
        }

        self.history.record_week(&week)?;
        let delivered = self.deliver(&week).await;

        tracing::info!(
            week_label = %week.week_label,
            restaurants = week.restaurants.len(),
            candidates = candidates.len(),
            sinks_delivered = delivered,
            sinks_total = self.sinks.len(),
            "Weekly run complete"
        );

        Ok(week)
    }

    /// Travel estimates for candidates that are neither visited nor recent
    ///
    /// A failed estimate leaves the candidate without an entry; the filter
    /// then keeps it.
    async fn annotate_travel(
        &mut self,
        candidates: &[Candidate],
        visited: &HashSet<String>,
        recent: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> HashMap<String, TravelEstimate> {
        let mut travel = HashMap::new();
        let mut misses = 0usize;
        let mut failures = 0usize;

        for candidate in candidates {
            if visited.contains(&candidate.id) || recent.contains(&candidate.id) {
                continue;
            }

            let lookup = self
                .travel_cache
                .fetch_at(
                    &candidate.id,
                    self.settings.origin,
                    candidate.location,
                    self.settings.travel_cache_expiry_days,
                    now,
                )
                .await;

            match lookup {
                Ok(lookup) => {
                    if !lookup.hit {
                        misses += 1;
                        pace(self.settings.routing_pace).await;
                    }
                    travel.insert(candidate.id.clone(), lookup.estimate);
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        place_id = %candidate.id,
                        transient = e.is_transient(),
                        error = %e,
                        "Travel estimate failed, keeping candidate without one"
                    );
                }
            }
        }

        tracing::info!(
            estimated = travel.len(),
            cache_misses = misses,
            failures = failures,
            "Travel estimates ready"
        );
        travel
    }

    async fn enrich(
        &self,
        selected: &[Candidate],
        travel: &HashMap<String, TravelEstimate>,
    ) -> Vec<Recommendation> {
        let mut restaurants = Vec::with_capacity(selected.len());

        for (i, candidate) in selected.iter().enumerate() {
            if i > 0 {
                pace(self.settings.details_pace).await;
            }

            let details = match self.places.get_details(&candidate.id).await {
                Ok(details) => details,
                Err(e) => {
                    tracing::warn!(
                        place_id = %candidate.id,
                        error = %e,
                        "Details lookup failed, using search data"
                    );
                    PlaceDetails::from(candidate)
                }
            };

            restaurants.push(build_recommendation(candidate, details, travel.get(&candidate.id)));
        }

        tracing::info!(restaurants = restaurants.len(), "Recommendations enriched");
        restaurants
    }

    /// Number of sinks that accepted the week
    async fn deliver(&self, week: &WeeklyRecommendation) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.deliver(week).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::error!(sink = sink.name(), error = %e, "Delivery failed");
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RouteLeg, SearchPage};
    use crate::services::providers::{MockPlaceProvider, MockRecommendationSink, MockRoutingOracle};
    use crate::services::travel::TravelEstimator;
    use tempfile::TempDir;

    const ORIGIN: LatLng = LatLng {
        lat: 35.681236,
        lng: 139.767125,
    };

    fn settings(pick_count: usize) -> RunSettings {
        RunSettings {
            origin: ORIGIN,
            queries: vec!["restaurant".to_string()],
            search: SearchSettings {
                origin: ORIGIN,
                radius_meters: 30_000,
                min_rating: 4.0,
                max_pages_per_query: 1,
                page_pace: Duration::ZERO,
                query_pace: Duration::ZERO,
            },
            criteria: FilterCriteria {
                min_reviews: 50,
                max_travel_minutes: 90,
            },
            pick_count,
            recent_weeks: 4,
            travel_cache_expiry_days: 90,
            routing_pace: Duration::ZERO,
            details_pace: Duration::ZERO,
            utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
        }
    }

    fn candidate(id: &str, review_count: u32) -> Candidate {
        Candidate::new(id, Some(4.5), review_count, LatLng::new(35.70, 139.80))
    }

    fn places_returning(candidates: Vec<Candidate>) -> MockPlaceProvider {
        let mut places = MockPlaceProvider::new();
        places.expect_search().returning(move |_, _| {
            Ok(SearchPage {
                candidates: candidates.clone(),
                next_page_token: None,
            })
        });
        places
            .expect_get_details()
            .returning(|id| Err(AppError::ExternalApi(format!("no details for {}", id))));
        places.expect_name().return_const("mock");
        places
    }

    fn oracle() -> MockRoutingOracle {
        let mut oracle = MockRoutingOracle::new();
        oracle.expect_compute_route().returning(|_, _, _| {
            Ok(Some(RouteLeg {
                duration_seconds: 1200,
                distance_meters: 10_000,
            }))
        });
        oracle
    }

    fn recommender(dir: &TempDir, places: MockPlaceProvider, pick_count: usize) -> Recommender {
        let settings = settings(pick_count);
        let cache = TravelCache::open(
            dir.path().join("travel_cache.json"),
            TravelEstimator::new(Arc::new(oracle())),
            settings.utc_offset,
        );
        let history = HistoryStore::new(
            dir.path().join("visited.json"),
            dir.path().join("history.json"),
            dir.path().join("archive.json"),
        );
        Recommender::new(Arc::new(places), cache, history, settings)
    }

    #[tokio::test]
    async fn test_no_candidates_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = recommender(&dir, places_returning(vec![]), 5);

        let err = r.run(false).await.unwrap_err();
        assert!(matches!(err, AppError::NoCandidates));
        assert!(!dir.path().join("history.json").exists());
    }

    #[tokio::test]
    async fn test_none_after_filtering_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = recommender(&dir, places_returning(vec![candidate("few", 3)]), 5);

        let err = r.run(false).await.unwrap_err();
        assert!(matches!(err, AppError::NoneAfterFiltering));
        assert!(!dir.path().join("history.json").exists());
    }

    #[tokio::test]
    async fn test_run_records_and_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let places = places_returning(vec![candidate("a", 120), candidate("b", 10)]);
        let mut sink = MockRecommendationSink::new();
        sink.expect_deliver()
            .withf(|week| week.restaurants.len() == 1 && week.restaurants[0].place_id == "a")
            .times(1)
            .returning(|_| Ok(()));
        sink.expect_name().return_const("mock sink");

        let mut r = recommender(&dir, places, 5).with_sink(Arc::new(sink));
        let week = r.run(false).await.unwrap();

        assert_eq!(week.restaurants.len(), 1);
        let rec = &week.restaurants[0];
        assert_eq!(rec.travel_time_minutes, Some(30));
        assert_eq!(rec.travel_cost_yen, Some(300));

        let history = HistoryStore::new(
            dir.path().join("visited.json"),
            dir.path().join("history.json"),
            dir.path().join("archive.json"),
        );
        assert!(history.load_recent(4).contains("a"));
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut failing = MockRecommendationSink::new();
        failing
            .expect_deliver()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        failing.expect_name().return_const("failing");
        let mut working = MockRecommendationSink::new();
        working.expect_deliver().times(1).returning(|_| Ok(()));
        working.expect_name().return_const("working");

        let mut r = recommender(&dir, places_returning(vec![candidate("a", 120)]), 5)
            .with_sink(Arc::new(failing))
            .with_sink(Arc::new(working));

        tokio_test::assert_ok!(r.run(false).await);
    }

    #[tokio::test]
    async fn test_dry_run_skips_history_and_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MockRecommendationSink::new();
        sink.expect_deliver().times(0);
        sink.expect_name().return_const("mock sink");

        let mut r = recommender(&dir, places_returning(vec![candidate("a", 120)]), 5)
            .with_sink(Arc::new(sink));
        let week = r.run(true).await.unwrap();

        assert_eq!(week.restaurants.len(), 1);
        assert!(!dir.path().join("history.json").exists());
        assert!(dir.path().join("travel_cache.json").exists());
    }

    #[tokio::test]
    async fn test_recent_picks_excluded_next_week() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();

        let mut r = recommender(&dir, places_returning(vec![candidate("a", 120)]), 5);
        r.run_at(now - chrono::Duration::weeks(1), false).await.unwrap();

        let mut r = recommender(&dir, places_returning(vec![candidate("a", 120)]), 5);
        let err = r.run_at(now, false).await.unwrap_err();
        assert!(matches!(err, AppError::NoneAfterFiltering));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::from_pairs(vec![
            ("GOOGLE_API_KEY".to_string(), "key".to_string()),
            ("PICK_COUNT".to_string(), "3".to_string()),
            ("ROUTING_PACE_MS".to_string(), "0".to_string()),
        ])
        .unwrap();

        let settings = RunSettings::from_config(&config);
        assert_eq!(settings.pick_count, 3);
        assert_eq!(settings.routing_pace, Duration::ZERO);
        assert_eq!(settings.details_pace, Duration::from_millis(300));
        assert_eq!(settings.criteria.min_reviews, 50);
        assert_eq!(settings.search.origin, settings.origin);
    }
}
