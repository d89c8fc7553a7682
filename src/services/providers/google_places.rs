/// Google Places API (New) provider
///
/// Text search is used to build the candidate pool; place details are only
/// fetched for the final selection because they are billed at a higher tier.
///
/// API Flow:
/// 1. Search: POST /places:searchText → up to 20 places + nextPageToken
/// 2. Details: GET /places/{id} → opening hours, reviews, contact data
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{places::ApiSearchResponse, ApiPlace, Candidate, PlaceDetails, SearchPage},
    services::providers::{PlaceProvider, SearchQuery},
};

const MAX_RESULT_COUNT: u32 = 20;
const INCLUDED_TYPE: &str = "restaurant";
const LANGUAGE_CODE: &str = "ja";

const SEARCH_FIELDS: &[&str] = &[
    "places.id",
    "places.displayName",
    "places.rating",
    "places.userRatingCount",
    "places.priceLevel",
    "places.formattedAddress",
    "places.location",
    "places.primaryType",
    "places.googleMapsUri",
    "nextPageToken",
];

const DETAIL_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "rating",
    "userRatingCount",
    "priceLevel",
    "formattedAddress",
    "location",
    "primaryType",
    "googleMapsUri",
    "regularOpeningHours",
    "reservable",
    "websiteUri",
    "nationalPhoneNumber",
    "reviews",
];

// ============================================================================
// Request body
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    location_bias: LocationBias,
    included_type: &'static str,
    language_code: &'static str,
    min_rating: f64,
    max_result_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LocationBias {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: Center,
    radius: f64,
}

#[derive(Debug, Serialize)]
struct Center {
    latitude: f64,
    longitude: f64,
}

impl<'a> SearchTextRequest<'a> {
    fn new(query: &'a SearchQuery, page_token: Option<String>) -> Self {
        Self {
            text_query: &query.text,
            location_bias: LocationBias {
                circle: Circle {
                    center: Center {
                        latitude: query.origin.lat,
                        longitude: query.origin.lng,
                    },
                    radius: f64::from(query.radius_meters),
                },
            },
            included_type: INCLUDED_TYPE,
            language_code: LANGUAGE_CODE,
            min_rating: query.min_rating,
            max_result_count: MAX_RESULT_COUNT,
            page_token: page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Converts a raw search response into candidates, dropping unusable places
fn into_search_page(response: ApiSearchResponse) -> SearchPage {
    let total = response.places.len();
    let candidates: Vec<Candidate> = response
        .places
        .into_iter()
        .filter_map(|place| Candidate::try_from(place).ok())
        .collect();

    if candidates.len() < total {
        tracing::debug!(
            dropped = total - candidates.len(),
            "Dropped search results without id or location"
        );
    }

    SearchPage {
        candidates,
        next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
    }
}

#[derive(Clone)]
pub struct GooglePlacesClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn error_for_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalApi(format!(
            "Places API returned status {}: {}",
            status, body
        )))
    }
}

#[async_trait::async_trait]
impl PlaceProvider for GooglePlacesClient {
    async fn search(&self, query: &SearchQuery, page_token: Option<String>) -> AppResult<SearchPage> {
        let url = format!("{}/places:searchText", self.api_url);
        let body = SearchTextRequest::new(query, page_token);

        let response = self
            .http_client
            .post(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", SEARCH_FIELDS.join(","))
            .json(&body)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;

        let parsed: ApiSearchResponse = response.json().await?;
        let page = into_search_page(parsed);

        tracing::debug!(
            query = %query.text,
            results = page.candidates.len(),
            has_next = page.next_page_token.is_some(),
            "Places search page fetched"
        );

        Ok(page)
    }

    async fn get_details(&self, place_id: &str) -> AppResult<PlaceDetails> {
        if place_id.trim().is_empty() {
            return Err(AppError::ExternalApi(
                "Place details requested for an empty id".to_string(),
            ));
        }

        let url = format!("{}/places/{}", self.api_url, place_id);

        let response = self
            .http_client
            .get(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", DETAIL_FIELDS.join(","))
            .query(&[("languageCode", LANGUAGE_CODE)])
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;

        let place: ApiPlace = response.json().await?;
        let mut details = PlaceDetails::from(place);
        if details.id.is_empty() {
            details.id = place_id.to_string();
        }

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "Google Places"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLng;

    fn query() -> SearchQuery {
        SearchQuery {
            text: "ramen".to_string(),
            origin: LatLng::new(35.681236, 139.767125),
            radius_meters: 30_000,
            min_rating: 4.0,
        }
    }

    #[test]
    fn test_search_body_shape() {
        let q = query();
        let body = serde_json::to_value(SearchTextRequest::new(&q, None)).unwrap();

        assert_eq!(body["textQuery"], "ramen");
        assert_eq!(body["includedType"], "restaurant");
        assert_eq!(body["maxResultCount"], 20);
        assert_eq!(body["minRating"], 4.0);
        assert_eq!(body["locationBias"]["circle"]["radius"], 30_000.0);
        assert_eq!(body["locationBias"]["circle"]["center"]["latitude"], 35.681236);
        assert!(body.get("pageToken").is_none());
    }

    #[test]
    fn test_search_body_carries_page_token() {
        let q = query();
        let body =
            serde_json::to_value(SearchTextRequest::new(&q, Some("next".to_string()))).unwrap();
        assert_eq!(body["pageToken"], "next");

        let body = serde_json::to_value(SearchTextRequest::new(&q, Some(String::new()))).unwrap();
        assert!(body.get("pageToken").is_none());
    }

    #[test]
    fn test_field_masks() {
        assert!(SEARCH_FIELDS.contains(&"nextPageToken"));
        assert!(SEARCH_FIELDS.iter().all(|f| *f == "nextPageToken" || f.starts_with("places.")));
        assert!(DETAIL_FIELDS.contains(&"reviews"));
        assert!(DETAIL_FIELDS.iter().all(|f| !f.starts_with("places.")));
    }

    #[test]
    fn test_into_search_page_drops_unusable_places() {
        let json = r#"{
            "places": [
                {"id": "a", "displayName": {"text": "A"}, "rating": 4.5,
                 "userRatingCount": 120, "location": {"latitude": 35.6, "longitude": 139.7}},
                {"id": "no_location", "rating": 4.9},
                {"displayName": {"text": "No id"}, "location": {"latitude": 35.6, "longitude": 139.7}}
            ],
            "nextPageToken": "tok"
        }"#;
        let response: ApiSearchResponse = serde_json::from_str(json).unwrap();

        let page = into_search_page(response);

        assert_eq!(page.candidates.len(), 1);
        assert_eq!(page.candidates[0].id, "a");
        assert_eq!(page.candidates[0].review_count, 120);
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_into_search_page_empty_response() {
        let response: ApiSearchResponse = serde_json::from_str("{}").unwrap();
        let page = into_search_page(response);
        assert!(page.candidates.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = GooglePlacesClient::new(
            "key".to_string(),
            "https://places.example.com/v1/".to_string(),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(client.api_url, "https://places.example.com/v1");
        assert_eq!(client.name(), "Google Places");
    }
}
