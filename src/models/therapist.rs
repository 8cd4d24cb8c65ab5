// Therapist finder models (places search results)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A mental-health specialist found near the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Therapist {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub location: GeoPoint,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub open_now: Option<bool>,
    pub types: Vec<String>,
    /// Great-circle distance from the search point
    pub distance_km: f64,
}

/// Place details for a single specialist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistDetails {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub maps_url: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Vec<String>,
    pub location: Option<GeoPoint>,
}

/// Query for GET /v1/therapists/nearby
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius_m: u32,
}

fn default_radius() -> u32 {
    5000
}
