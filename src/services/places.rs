// Places service - nearby mental-health specialists
// Google Places nearby search + details, filtered client-side.

use reqwest::Client;
use serde::Deserialize;

use crate::models::{GeoPoint, Therapist, TherapistDetails};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const EARTH_RADIUS_KM: f64 = 6371.0;

const SEARCH_KEYWORD: &str = "psychologist";
const SEARCH_TYPE: &str = "health";

/// Name or type fragments that mark a mental-health specialist
const SPECIALIST_KEYWORDS: &[&str] = &[
    "psycholog",
    "psychiatr",
    "therap",
    "counsel",
    "mental",
    "psicolog",
    "terapi",
];

/// Place types that are never a specialist even when the name matches
const EXCLUDED_TYPES: &[&str] = &[
    "veterinary_care",
    "pharmacy",
    "physiotherapist",
    "beauty_salon",
    "spa",
    "gym",
];

const DETAIL_FIELDS: &str =
    "place_id,name,formatted_address,formatted_phone_number,website,url,rating,opening_hours,geometry";

// ===== Places API payloads =====

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    vicinity: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Debug, Clone, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: String,
    name: String,
    formatted_address: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
    url: Option<String>,
    rating: Option<f64>,
    opening_hours: Option<OpeningHours>,
    geometry: Option<Geometry>,
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn is_specialist(place: &PlaceResult) -> bool {
    if place
        .types
        .iter()
        .any(|t| EXCLUDED_TYPES.contains(&t.as_str()))
    {
        return false;
    }

    let name = place.name.to_lowercase();
    SPECIALIST_KEYWORDS
        .iter()
        .any(|k| name.contains(k) || place.types.iter().any(|t| t.contains(k)))
}

/// Filter, de-duplicate and sort raw results by distance from `origin`
fn rank_specialists(places: Vec<PlaceResult>, origin: GeoPoint) -> Vec<Therapist> {
    let mut seen = std::collections::HashSet::new();
    let mut therapists: Vec<Therapist> = places
        .into_iter()
        .filter(is_specialist)
        .filter(|p| seen.insert(p.place_id.clone()))
        .filter_map(|p| {
            let location = p.geometry.as_ref()?.location;
            Some(Therapist {
                distance_km: haversine_km(origin, location),
                place_id: p.place_id,
                name: p.name,
                address: p.vicinity,
                location,
                rating: p.rating,
                user_ratings_total: p.user_ratings_total,
                open_now: p.opening_hours.and_then(|h| h.open_now),
                types: p.types,
            })
        })
        .collect();

    therapists.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    therapists
}

/// Places API client
pub struct PlacesService {
    client: Client,
    api_key: Option<String>,
}

impl PlacesService {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, BoxError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| "GOOGLE_MAPS_API_KEY not configured".into())
    }

    /// Specialists within `radius_m` of the point, nearest first
    pub async fn nearby_specialists(
        &self,
        origin: GeoPoint,
        radius_m: u32,
        language: &str,
    ) -> Result<Vec<Therapist>, BoxError> {
        let url = format!("{}/nearbysearch/json", PLACES_BASE_URL);
        let location = format!("{},{}", origin.lat, origin.lng);
        let radius = radius_m.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", SEARCH_KEYWORD),
                ("type", SEARCH_TYPE),
                ("language", language),
                ("key", self.api_key()?),
            ])
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Places search error: {}", error_text).into());
        }

        let body: NearbyResponse = response.json().await?;
        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            status => {
                return Err(format!(
                    "Places search failed ({}): {}",
                    status,
                    body.error_message.unwrap_or_default()
                )
                .into())
            }
        }

        let raw_count = body.results.len();
        let therapists = rank_specialists(body.results, origin);
        tracing::info!(
            "Places search returned {} results, {} specialists",
            raw_count,
            therapists.len()
        );
        Ok(therapists)
    }

    /// Contact details for one place; `None` when the id is unknown
    pub async fn place_details(
        &self,
        place_id: &str,
        language: &str,
    ) -> Result<Option<TherapistDetails>, BoxError> {
        let url = format!("{}/details/json", PLACES_BASE_URL);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("language", language),
                ("key", self.api_key()?),
            ])
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Place details error: {}", error_text).into());
        }

        let body: DetailsResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => {}
            "NOT_FOUND" | "INVALID_REQUEST" | "ZERO_RESULTS" => return Ok(None),
            status => {
                return Err(format!(
                    "Place details failed ({}): {}",
                    status,
                    body.error_message.unwrap_or_default()
                )
                .into())
            }
        }

        Ok(body.result.map(|r| TherapistDetails {
            place_id: r.place_id,
            name: r.name,
            address: r.formatted_address,
            phone: r.formatted_phone_number,
            website: r.website,
            maps_url: r.url,
            rating: r.rating,
            opening_hours: r.opening_hours.map(|h| h.weekday_text).unwrap_or_default(),
            location: r.geometry.map(|g| g.location),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, name: &str, types: &[&str], lat: f64, lng: f64) -> PlaceResult {
        PlaceResult {
            place_id: id.to_string(),
            name: name.to_string(),
            vicinity: None,
            geometry: Some(Geometry {
                location: GeoPoint { lat, lng },
            }),
            rating: None,
            user_ratings_total: None,
            opening_hours: None,
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        let paris = GeoPoint { lat: 48.8566, lng: 2.3522 };
        let london = GeoPoint { lat: 51.5074, lng: -0.1278 };
        let d = haversine_km(paris, london);
        assert!((d - 343.5).abs() < 1.0, "got {}", d);
        assert_eq!(haversine_km(paris, paris), 0.0);
        assert!((haversine_km(london, paris) - d).abs() < 1e-9);
    }

    #[test]
    fn test_specialist_filter() {
        assert!(is_specialist(&place("a", "Dr. Ruiz Psicología", &["health"], 0.0, 0.0)));
        assert!(is_specialist(&place("b", "Family Counselling Centre", &["health"], 0.0, 0.0)));
        assert!(is_specialist(&place("c", "Northside Clinic", &["health", "psychiatrist"], 0.0, 0.0)));
        assert!(!is_specialist(&place("d", "City Dental", &["dentist", "health"], 0.0, 0.0)));
        assert!(!is_specialist(&place("e", "Sports Therapy", &["physiotherapist", "health"], 0.0, 0.0)));
        assert!(!is_specialist(&place("f", "Pet Therapy Vets", &["veterinary_care"], 0.0, 0.0)));
    }

    #[test]
    fn test_rank_dedupes_and_sorts_by_distance() {
        let origin = GeoPoint { lat: 40.0, lng: -3.0 };
        let places = vec![
            place("far", "Mental Health Center", &["health"], 40.05, -3.0),
            place("near", "Therapy Room", &["health"], 40.01, -3.0),
            place("near", "Therapy Room", &["health"], 40.01, -3.0),
            place("skip", "Pharmacy", &["pharmacy"], 40.0, -3.0),
        ];

        let ranked = rank_specialists(places, origin);
        let ids: Vec<&str> = ranked.iter().map(|t| t.place_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert!(ranked[0].distance_km < ranked[1].distance_km);
    }

    #[test]
    fn test_parse_nearby_payload() {
        let raw = r#"{
            "status": "OK",
            "results": [{
                "place_id": "p1",
                "name": "Mindful Psychology",
                "vicinity": "1 Main St",
                "geometry": {"location": {"lat": 1.0, "lng": 2.0}},
                "opening_hours": {"open_now": true},
                "types": ["health", "point_of_interest"]
            }]
        }"#;
        let body: NearbyResponse = serde_json::from_str(raw).unwrap();
        let ranked = rank_specialists(body.results, GeoPoint { lat: 1.0, lng: 2.0 });
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].open_now, Some(true));
        assert_eq!(ranked[0].address.as_deref(), Some("1 Main St"));
    }

    #[tokio::test]
    async fn test_unconfigured_service_errors() {
        let places = PlacesService::new(None);
        assert!(!places.is_configured());
        assert!(places
            .nearby_specialists(GeoPoint { lat: 0.0, lng: 0.0 }, 1000, "en")
            .await
            .is_err());
    }
}
