use serde::{Deserialize, Serialize};

use super::{Candidate, LatLng, PriceLevel};

// ============================================================================
// Places API (New) Types
// ============================================================================

/// Response from `POST /places:searchText`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchResponse {
    #[serde(default)]
    pub places: Vec<ApiPlace>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A place as returned by both text search and place details
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<ApiLocalizedText>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<u32>,
    #[serde(default)]
    pub price_level: Option<PriceLevel>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub location: Option<ApiLocation>,
    #[serde(default)]
    pub primary_type: Option<String>,
    #[serde(default)]
    pub google_maps_uri: Option<String>,
    #[serde(default)]
    pub regular_opening_hours: Option<ApiOpeningHours>,
    #[serde(default)]
    pub reservable: Option<bool>,
    #[serde(default)]
    pub website_uri: Option<String>,
    #[serde(default)]
    pub national_phone_number: Option<String>,
    #[serde(default)]
    pub reviews: Vec<ApiReview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocalizedText {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOpeningHours {
    #[serde(default)]
    pub weekday_descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiReview {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: Option<ApiLocalizedText>,
}

impl ApiPlace {
    fn name(&self) -> String {
        self.display_name
            .as_ref()
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }
}

/// Search results without an id or a location cannot be scored and are dropped
impl TryFrom<ApiPlace> for Candidate {
    type Error = ApiPlace;

    fn try_from(place: ApiPlace) -> Result<Self, Self::Error> {
        let (Some(id), Some(location)) = (place.id.clone(), place.location.clone()) else {
            return Err(place);
        };
        if id.is_empty() {
            return Err(place);
        }

        Ok(Candidate {
            name: place.name(),
            id,
            rating: place.rating,
            review_count: place.user_rating_count.unwrap_or(0),
            location: LatLng::new(location.latitude, location.longitude),
            price_level: place.price_level.unwrap_or_default(),
            address: place.formatted_address,
            google_maps_url: place.google_maps_uri,
            primary_type: place.primary_type,
        })
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

/// Full record for a selected restaurant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub price_level: PriceLevel,
    pub address: String,
    pub opening_hours: Vec<String>,
    pub reservable: Option<bool>,
    pub google_maps_url: String,
    pub website: String,
    pub phone: String,
    pub primary_type: String,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    pub text: String,
}

impl From<ApiPlace> for PlaceDetails {
    fn from(place: ApiPlace) -> Self {
        let name = place.name();
        PlaceDetails {
            id: place.id.unwrap_or_default(),
            name,
            rating: place.rating,
            review_count: place.user_rating_count.unwrap_or(0),
            price_level: place.price_level.unwrap_or_default(),
            address: place.formatted_address.unwrap_or_default(),
            opening_hours: place
                .regular_opening_hours
                .map(|h| h.weekday_descriptions)
                .unwrap_or_default(),
            reservable: place.reservable,
            google_maps_url: place.google_maps_uri.unwrap_or_default(),
            website: place.website_uri.unwrap_or_default(),
            phone: place.national_phone_number.unwrap_or_default(),
            primary_type: place.primary_type.unwrap_or_default(),
            reviews: place
                .reviews
                .into_iter()
                .map(|r| Review {
                    rating: r.rating.unwrap_or(0.0),
                    text: r.text.map(|t| t.text).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Search data stands in for details when the details lookup fails
impl From<&Candidate> for PlaceDetails {
    fn from(candidate: &Candidate) -> Self {
        PlaceDetails {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            rating: candidate.rating,
            review_count: candidate.review_count,
            price_level: candidate.price_level,
            address: candidate.address.clone().unwrap_or_default(),
            google_maps_url: candidate.google_maps_url.clone().unwrap_or_default(),
            primary_type: candidate.primary_type.clone().unwrap_or_default(),
            ..PlaceDetails::default()
        }
    }
}
