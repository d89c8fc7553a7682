/// Google Routes API routing oracle
///
/// Only the first route's duration and distance are requested; the travel
/// estimator turns them into a transit time and fare.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{routes::ApiRoutesResponse, LatLng, RouteLeg, RouteMode},
    services::providers::RoutingOracle,
};

const FIELD_MASK: &str = "routes.duration,routes.distanceMeters";
const LANGUAGE_CODE: &str = "ja";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest {
    origin: Waypoint,
    destination: Waypoint,
    travel_mode: RouteMode,
    language_code: &'static str,
}

#[derive(Debug, Serialize)]
struct Waypoint {
    location: WaypointLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WaypointLocation {
    lat_lng: ApiLatLng,
}

#[derive(Debug, Serialize)]
struct ApiLatLng {
    latitude: f64,
    longitude: f64,
}

impl From<LatLng> for Waypoint {
    fn from(point: LatLng) -> Self {
        Self {
            location: WaypointLocation {
                lat_lng: ApiLatLng {
                    latitude: point.lat,
                    longitude: point.lng,
                },
            },
        }
    }
}

/// First route of the response, or `None` when the API found no route
fn first_leg(response: ApiRoutesResponse) -> AppResult<Option<RouteLeg>> {
    response
        .routes
        .into_iter()
        .next()
        .map(|route| route.into_leg())
        .transpose()
}

#[derive(Clone)]
pub struct GoogleRoutesClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl GoogleRoutesClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }
}

#[async_trait::async_trait]
impl RoutingOracle for GoogleRoutesClient {
    async fn compute_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: RouteMode,
    ) -> AppResult<Option<RouteLeg>> {
        let body = ComputeRoutesRequest {
            origin: origin.into(),
            destination: destination.into(),
            travel_mode: mode,
            language_code: LANGUAGE_CODE,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Routes API returned status {}: {}",
                status, body
            )));
        }

        let parsed: ApiRoutesResponse = response.json().await?;
        let leg = first_leg(parsed)?;

        tracing::debug!(
            destination = %destination,
            found = leg.is_some(),
            "Route computed"
        );

        Ok(leg)
    }
}
