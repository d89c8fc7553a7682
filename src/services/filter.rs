use std::collections::{HashMap, HashSet};

use crate::models::{Candidate, TravelEstimate};

/// Thresholds a candidate has to meet to stay in the pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCriteria {
    pub min_reviews: u32,
    pub max_travel_minutes: u32,
}

/// Per-reason counters of a filter pass
///
/// A candidate is counted under the first rule it fails.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    pub visited: usize,
    pub recent: usize,
    pub too_few_reviews: usize,
    pub too_far: usize,
    pub retained: usize,
}

/// Drops visited, recently recommended, under-reviewed and too-distant candidates
///
/// Candidates without a travel estimate, or whose estimate has no time, are
/// kept: a failed lookup is not evidence that the place is far away.
/// Input order is preserved.
pub fn filter_candidates(
    candidates: &[Candidate],
    visited_ids: &HashSet<String>,
    recent_ids: &HashSet<String>,
    criteria: FilterCriteria,
    travel_info: &HashMap<String, TravelEstimate>,
) -> Vec<Candidate> {
    let (retained, stats) =
        filter_with_stats(candidates, visited_ids, recent_ids, criteria, travel_info);

    tracing::info!(
        input = stats.input,
        retained = stats.retained,
        visited = stats.visited,
        recent = stats.recent,
        too_few_reviews = stats.too_few_reviews,
        too_far = stats.too_far,
        min_reviews = criteria.min_reviews,
        max_travel_minutes = criteria.max_travel_minutes,
        "Candidates filtered"
    );

    retained
}

pub fn filter_with_stats(
    candidates: &[Candidate],
    visited_ids: &HashSet<String>,
    recent_ids: &HashSet<String>,
    criteria: FilterCriteria,
    travel_info: &HashMap<String, TravelEstimate>,
) -> (Vec<Candidate>, FilterStats) {
    let mut stats = FilterStats {
        input: candidates.len(),
        ..FilterStats::default()
    };
    let mut retained = Vec::new();

    for candidate in candidates {
        if visited_ids.contains(&candidate.id) {
            stats.visited += 1;
            continue;
        }
        if recent_ids.contains(&candidate.id) {
            stats.recent += 1;
            continue;
        }
        if candidate.review_count < criteria.min_reviews {
            stats.too_few_reviews += 1;
            continue;
        }
        let too_far = travel_info
            .get(&candidate.id)
            .and_then(|t| t.time_minutes)
            .is_some_and(|minutes| minutes > criteria.max_travel_minutes);
        if too_far {
            stats.too_far += 1;
            continue;
        }

        retained.push(candidate.clone());
    }

    stats.retained = retained.len();
    (retained, stats)
}
