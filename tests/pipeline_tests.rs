use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::FixedOffset;
use tempfile::TempDir;

use gourmet_recommender::{
    models::{
        BudgetTier, Candidate, LatLng, PlaceDetails, PriceLevel, RouteLeg, RouteMode, SearchPage,
        WeeklyRecommendation,
    },
    services::{
        filter::FilterCriteria,
        providers::{
            PlaceProvider, RecommendationSink, RoutingOracle, SearchQuery, SiteDataPublisher,
            VisitedSource,
        },
        search::SearchSettings,
        travel::TravelEstimator,
        Recommender, RunSettings,
    },
    store::{json_file, HistoryStore, TravelCache, TravelCacheEntry},
    AppError, AppResult,
};

const ORIGIN: LatLng = LatLng {
    lat: 35.681236,
    lng: 139.767125,
};

// ============================================================================
// Fakes
// ============================================================================

struct FakePlaces {
    results: Vec<Candidate>,
    details: HashMap<String, PlaceDetails>,
}

#[async_trait::async_trait]
impl PlaceProvider for FakePlaces {
    async fn search(&self, _query: &SearchQuery, _page_token: Option<String>) -> AppResult<SearchPage> {
        Ok(SearchPage {
            candidates: self.results.clone(),
            next_page_token: None,
        })
    }

    async fn get_details(&self, place_id: &str) -> AppResult<PlaceDetails> {
        self.details
            .get(place_id)
            .cloned()
            .ok_or_else(|| AppError::ExternalApi(format!("Places API returned status 404: {}", place_id)))
    }

    fn name(&self) -> &'static str {
        "fake places"
    }
}

/// Drives 20 minutes to anything south of 36°N, 100 minutes beyond
#[derive(Default)]
struct FakeOracle {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl RoutingOracle for FakeOracle {
    async fn compute_route(
        &self,
        _origin: LatLng,
        destination: LatLng,
        mode: RouteMode,
    ) -> AppResult<Option<RouteLeg>> {
        assert_eq!(mode, RouteMode::Drive);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let leg = if destination.lat < 36.0 {
            RouteLeg {
                duration_seconds: 1200,
                distance_meters: 10_000,
            }
        } else {
            RouteLeg {
                duration_seconds: 6000,
                distance_meters: 95_000,
            }
        };
        Ok(Some(leg))
    }
}

struct FakeSheet {
    visited: HashSet<String>,
}

#[async_trait::async_trait]
impl VisitedSource for FakeSheet {
    async fn fetch_visited(&self) -> AppResult<HashSet<String>> {
        Ok(self.visited.clone())
    }

    fn name(&self) -> &'static str {
        "fake sheet"
    }
}

#[derive(Default)]
struct RecordingSink {
    weeks: Mutex<Vec<WeeklyRecommendation>>,
}

#[async_trait::async_trait]
impl RecommendationSink for RecordingSink {
    async fn deliver(&self, week: &WeeklyRecommendation) -> AppResult<()> {
        self.weeks.lock().unwrap().push(week.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ============================================================================
// Fixture
// ============================================================================

fn candidate(id: &str, review_count: u32, lat: f64, lng: f64) -> Candidate {
    let mut c = Candidate::new(id, Some(4.4), review_count, LatLng::new(lat, lng));
    c.name = format!("Restaurant {}", id);
    c
}

fn search_results() -> Vec<Candidate> {
    vec![
        candidate("near", 200, 35.685, 139.767125),
        candidate("visited_local", 500, 35.70, 139.77),
        candidate("mid", 150, 35.75, 139.767125),
        candidate("visited_remote", 500, 35.70, 139.78),
        candidate("too_far", 900, 36.5, 139.767125),
        candidate("few_reviews", 12, 35.75, 139.80),
    ]
}

fn details() -> HashMap<String, PlaceDetails> {
    let mid = PlaceDetails {
        id: "mid".to_string(),
        name: "Kappo Mid".to_string(),
        rating: Some(4.7),
        review_count: 151,
        price_level: PriceLevel::Expensive,
        address: "Bunkyo, Tokyo".to_string(),
        opening_hours: vec!["Monday: 17:00 – 23:00".to_string()],
        ..PlaceDetails::default()
    };
    [("mid".to_string(), mid)].into()
}

fn settings() -> RunSettings {
    RunSettings {
        origin: ORIGIN,
        queries: vec!["restaurant".to_string(), "izakaya".to_string()],
        search: SearchSettings {
            origin: ORIGIN,
            radius_meters: 30_000,
            min_rating: 4.0,
            max_pages_per_query: 3,
            page_pace: Duration::ZERO,
            query_pace: Duration::ZERO,
        },
        criteria: FilterCriteria {
            min_reviews: 50,
            max_travel_minutes: 90,
        },
        pick_count: 10,
        recent_weeks: 4,
        travel_cache_expiry_days: 90,
        routing_pace: Duration::ZERO,
        details_pace: Duration::ZERO,
        utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
    }
}

struct Harness {
    dir: TempDir,
    oracle: Arc<FakeOracle>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data").join("visited.json"),
            r#"{"visited": [{"place_id": "visited_local", "name": "Old Favourite"}]}"#,
        )
        .unwrap();

        Self {
            dir,
            oracle: Arc::new(FakeOracle::default()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    fn data(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join("data").join(name)
    }

    fn site(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join("site").join(name)
    }

    fn recommender(&self) -> Recommender {
        let settings = settings();
        let cache = TravelCache::open(
            self.data("travel_cache.json"),
            TravelEstimator::new(self.oracle.clone()),
            settings.utc_offset,
        );
        let history = HistoryStore::new(
            self.data("visited.json"),
            self.data("history.json"),
            self.site("archive.json"),
        )
        .with_remote(Arc::new(FakeSheet {
            visited: ["visited_remote".to_string()].into(),
        }));
        let places = FakePlaces {
            results: search_results(),
            details: details(),
        };

        Recommender::new(Arc::new(places), cache, history, settings)
            .with_sink(Arc::new(SiteDataPublisher::new(
                self.dir.path().join("site"),
                self.data("visited.json"),
            )))
            .with_sink(self.sink.clone())
    }

    fn oracle_calls(&self) -> usize {
        self.oracle.calls.load(Ordering::SeqCst)
    }
}

fn ids(week: &WeeklyRecommendation) -> Vec<&str> {
    week.restaurants.iter().map(|r| r.place_id.as_str()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_weekly_run_end_to_end() {
    let harness = Harness::new();

    let week = harness.recommender().run(false).await.unwrap();

    assert_eq!(ids(&week), vec!["near", "mid"]);

    let near = &week.restaurants[0];
    assert_eq!(near.travel_cost_yen, Some(0));
    assert!(near.travel_summary.starts_with("Walk"));
    assert_eq!(near.name, "Restaurant near");
    assert_eq!(near.budget_tier, BudgetTier::Average);

    let mid = &week.restaurants[1];
    assert_eq!(mid.name, "Kappo Mid");
    assert_eq!(mid.travel_time_minutes, Some(30));
    assert_eq!(mid.travel_cost_yen, Some(300));
    assert_eq!(mid.budget_tier, BudgetTier::Premium);
    assert_eq!(mid.budget_label, "Premium");
    assert_eq!(mid.price_range_dinner, "¥6,000〜");
    assert_eq!(mid.opening_hours.len(), 1);

    // mid, too_far and few_reviews needed the oracle; near was walked
    assert_eq!(harness.oracle_calls(), 3);
    let cache: HashMap<String, TravelCacheEntry> =
        json_file::load_or_default(&harness.data("travel_cache.json"));
    let mut cached: Vec<&str> = cache.keys().map(String::as_str).collect();
    cached.sort_unstable();
    assert_eq!(cached, vec!["few_reviews", "mid", "near", "too_far"]);
    assert_eq!(cache["too_far"].travel_time_minutes, Some(150));

    let history: serde_json::Value = json_file::load_or_default(&harness.data("history.json"));
    assert_eq!(history["weeks"].as_array().unwrap().len(), 1);
    assert_eq!(history["weeks"][0]["restaurants"][1]["place_id"], "mid");

    let archive: serde_json::Value = json_file::load_or_default(&harness.site("archive.json"));
    assert_eq!(archive["weeks"][0]["restaurants"][1]["name"], "Kappo Mid");
    assert_eq!(archive["weeks"][0]["restaurants"][1]["budget_label"], "Premium");

    let current: serde_json::Value = json_file::load_or_default(&harness.site("current.json"));
    assert_eq!(current["week_label"], week.week_label.as_str());
    assert!(harness.site("visited.json").exists());

    assert_eq!(harness.sink.weeks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_run_uses_cache_and_excludes_recent() {
    let harness = Harness::new();
    harness.recommender().run(false).await.unwrap();
    let calls_after_first = harness.oracle_calls();

    let err = harness.recommender().run(false).await.unwrap_err();

    assert!(matches!(err, AppError::NoneAfterFiltering));
    assert_eq!(harness.oracle_calls(), calls_after_first);
    assert_eq!(harness.sink.weeks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dry_run_leaves_history_untouched() {
    let harness = Harness::new();

    let week = harness.recommender().run(true).await.unwrap();

    assert_eq!(ids(&week), vec!["near", "mid"]);
    assert!(!harness.data("history.json").exists());
    assert!(!harness.site("current.json").exists());
    assert!(harness.data("travel_cache.json").exists());
    assert!(harness.sink.weeks.lock().unwrap().is_empty());

    // Nothing was recorded, so a real run can still pick the same places
    let week = harness.recommender().run(false).await.unwrap();
    assert_eq!(ids(&week), vec!["near", "mid"]);
}
