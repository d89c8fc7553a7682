use crate::models::LatLng;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    EARTH_RADIUS_KM * 2.0 * a.sqrt().min(1.0).asin()
}

pub fn distance_between(a: LatLng, b: LatLng) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}
