use std::collections::HashSet;
use std::time::Duration;

use crate::{
    models::{Candidate, LatLng},
    services::{
        pace,
        providers::{PlaceProvider, SearchQuery},
    },
};

/// Parameters shared by every query of a search run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub origin: LatLng,
    pub radius_meters: u32,
    pub min_rating: f64,
    pub max_pages_per_query: u32,
    pub page_pace: Duration,
    pub query_pace: Duration,
}

/// Runs every query through the provider and returns unique candidates
///
/// Pages are followed until the provider stops returning a token or the page
/// limit is reached. A failing page ends that query only; whatever was
/// collected so far is kept. The first occurrence of an id wins.
pub async fn search_all(
    provider: &dyn PlaceProvider,
    queries: &[String],
    settings: &SearchSettings,
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for (i, text) in queries.iter().enumerate() {
        if i > 0 {
            pace(settings.query_pace).await;
        }

        let query = SearchQuery {
            text: text.clone(),
            origin: settings.origin,
            radius_meters: settings.radius_meters,
            min_rating: settings.min_rating,
        };
        let mut page_token: Option<String> = None;
        let mut added = 0usize;

        for page in 0..settings.max_pages_per_query {
            let result = match provider.search(&query, page_token.take()).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        query = %text,
                        page = page,
                        error = %e,
                        "Search page failed, moving to next query"
                    );
                    break;
                }
            };

            for candidate in result.candidates {
                if seen.insert(candidate.id.clone()) {
                    candidates.push(candidate);
                    added += 1;
                }
            }

            match result.next_page_token {
                Some(token) => {
                    page_token = Some(token);
                    pace(settings.page_pace).await;
                }
                None => break,
            }
        }

        tracing::info!(
            query = %text,
            added = added,
            unique_total = candidates.len(),
            "Search query finished"
        );
    }

    tracing::info!(total = candidates.len(), "Search complete");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::SearchPage;
    use crate::services::providers::MockPlaceProvider;

    fn settings(max_pages: u32) -> SearchSettings {
        SearchSettings {
            origin: LatLng::new(35.68, 139.76),
            radius_meters: 30_000,
            min_rating: 4.0,
            max_pages_per_query: max_pages,
            page_pace: Duration::ZERO,
            query_pace: Duration::ZERO,
        }
    }

    fn candidate(id: &str) -> Candidate {
        Candidate::new(id, Some(4.5), 100, LatLng::new(35.6, 139.7))
    }

    fn page(ids: &[&str], next: Option<&str>) -> SearchPage {
        SearchPage {
            candidates: ids.iter().map(|id| candidate(id)).collect(),
            next_page_token: next.map(|t| t.to_string()),
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_dedup_across_queries_first_wins() {
        let mut provider = MockPlaceProvider::new();
        provider
            .expect_search()
            .withf(|q, _| q.text == "ramen")
            .returning(|_, _| Ok(page(&["a", "b"], None)));
        provider
            .expect_search()
            .withf(|q, _| q.text == "sushi")
            .returning(|_, _| Ok(page(&["b", "c"], None)));
        provider.expect_name().return_const("mock");

        let queries = vec!["ramen".to_string(), "sushi".to_string()];
        let result = search_all(&provider, &queries, &settings(3)).await;

        assert_eq!(ids(&result), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_follows_page_tokens_up_to_limit() {
        let mut provider = MockPlaceProvider::new();
        provider
            .expect_search()
            .withf(|_, token| token.is_none())
            .times(1)
            .returning(|_, _| Ok(page(&["a"], Some("p2"))));
        provider
            .expect_search()
            .withf(|_, token| token.as_deref() == Some("p2"))
            .times(1)
            .returning(|_, _| Ok(page(&["b"], Some("p3"))));
        provider.expect_name().return_const("mock");

        let result = search_all(&provider, &["ramen".to_string()], &settings(2)).await;

        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_earlier_results() {
        let mut provider = MockPlaceProvider::new();
        provider
            .expect_search()
            .withf(|q, token| q.text == "ramen" && token.is_none())
            .returning(|_, _| Ok(page(&["a"], Some("p2"))));
        provider
            .expect_search()
            .withf(|q, token| q.text == "ramen" && token.is_some())
            .returning(|_, _| Err(AppError::ExternalApi("Places API returned status 500".into())));
        provider
            .expect_search()
            .withf(|q, _| q.text == "sushi")
            .returning(|_, _| Ok(page(&["z"], None)));
        provider.expect_name().return_const("mock");

        let queries = vec!["ramen".to_string(), "sushi".to_string()];
        let result = search_all(&provider, &queries, &settings(3)).await;

        assert_eq!(ids(&result), vec!["a", "z"]);
    }

    #[tokio::test]
    async fn test_no_queries() {
        let provider = MockPlaceProvider::new();
        assert!(search_all(&provider, &[], &settings(3)).await.is_empty());
    }

    #[tokio::test]
    async fn test_query_passes_settings() {
        let mut provider = MockPlaceProvider::new();
        provider
            .expect_search()
            .withf(|q, _| q.radius_meters == 30_000 && q.min_rating == 4.0 && q.origin.lat == 35.68)
            .times(1)
            .returning(|_, _| Ok(page(&[], None)));
        provider.expect_name().return_const("mock");

        let result = search_all(&provider, &["izakaya".to_string()], &settings(3)).await;
        assert!(result.is_empty());
    }
}
