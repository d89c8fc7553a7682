use crate::models::{
    places::Review, BudgetTier, Candidate, MealType, PlaceDetails, Recommendation, TravelEstimate,
};

/// Only the first few reviews are considered for the menu excerpt
pub const MENU_REVIEW_WINDOW: usize = 5;
pub const MENU_EXCERPT_CHARS: usize = 100;

/// Excerpt of the best-rated review among the first few
///
/// Ties keep the earlier review. Reviews rated 0 or with empty text never
/// produce an excerpt.
pub fn extract_menu(reviews: &[Review]) -> Option<String> {
    let mut best: Option<&Review> = None;
    for review in reviews.iter().take(MENU_REVIEW_WINDOW) {
        let best_rating = best.map(|b| b.rating).unwrap_or(0.0);
        if review.rating > best_rating {
            best = Some(review);
        }
    }

    let text = best?.text.trim();
    if text.is_empty() {
        return None;
    }

    if text.chars().count() > MENU_EXCERPT_CHARS {
        let excerpt: String = text.chars().take(MENU_EXCERPT_CHARS).collect();
        Some(format!("{}...", excerpt))
    } else {
        Some(text.to_string())
    }
}

/// Combines a selected candidate, its details and its travel estimate
///
/// `details` may be the search-data fallback; empty detail fields then fall
/// back to what the candidate carries.
pub fn build_recommendation(
    candidate: &Candidate,
    details: PlaceDetails,
    travel: Option<&TravelEstimate>,
) -> Recommendation {
    let tier = BudgetTier::from(details.price_level);
    let recommended_menu = extract_menu(&details.reviews);

    let name = if details.name.is_empty() {
        candidate.name.clone()
    } else {
        details.name
    };
    let address = if details.address.is_empty() {
        candidate.address.clone().unwrap_or_default()
    } else {
        details.address
    };

    Recommendation {
        place_id: candidate.id.clone(),
        name,
        rating: details.rating.or(candidate.rating),
        user_rating_count: details.review_count,
        budget_tier: tier,
        budget_label: tier.label().to_string(),
        price_range_lunch: tier.price_range(MealType::Lunch),
        price_range_dinner: tier.price_range(MealType::Dinner),
        address,
        travel_time_minutes: travel.and_then(|t| t.time_minutes),
        travel_cost_yen: travel.and_then(|t| t.cost_yen),
        travel_summary: travel.map(|t| t.summary.clone()).unwrap_or_default(),
        reservable: details.reservable,
        opening_hours: details.opening_hours,
        google_maps_url: details.google_maps_url,
        website: details.website,
        phone: details.phone,
        primary_type: details.primary_type,
        recommended_menu,
    }
}
