// Therapist finder routes
// Endpoints: /v1/therapists/*

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::models::{ActivityCategory, GeoPoint, NearbyQuery, Therapist, TherapistDetails};
use crate::routes::{track_activity, translator_for};
use crate::AppState;

const MAX_RADIUS_M: u32 = 50_000;

type ApiError = (StatusCode, String);

fn unavailable() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "Therapist search is not configured".to_string(),
    )
}

fn validate_query(query: &NearbyQuery) -> Result<GeoPoint, ApiError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err((StatusCode::BAD_REQUEST, "Invalid coordinates".to_string()));
    }
    if query.radius_m == 0 || query.radius_m > MAX_RADIUS_M {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("radius_m must be 1-{}", MAX_RADIUS_M),
        ));
    }
    Ok(GeoPoint {
        lat: query.lat,
        lng: query.lng,
    })
}

/// GET /v1/therapists/nearby?lat=&lng=&radius_m=
async fn nearby(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<Therapist>>, ApiError> {
    let origin = validate_query(&query)?;
    if !state.places.is_configured() {
        return Err(unavailable());
    }

    tracing::info!("Searching specialists for user {} within {}m", user.uid, query.radius_m);
    let translator = translator_for(&state, &user.uid).await;

    let therapists = state
        .places
        .nearby_specialists(origin, query.radius_m, translator.code())
        .await
        .map_err(|e| {
            tracing::error!("Specialist search failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    track_activity(&state, &user.uid, ActivityCategory::Therapist, None).await;

    Ok(Json(therapists))
}

/// GET /v1/therapists/:place_id
async fn details(
    user: AuthUser,
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<Json<TherapistDetails>, ApiError> {
    if !state.places.is_configured() {
        return Err(unavailable());
    }

    let translator = translator_for(&state, &user.uid).await;
    match state.places.place_details(&place_id, translator.code()).await {
        Ok(Some(details)) => Ok(Json(details)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Place not found".to_string())),
        Err(e) => {
            tracing::error!("Place details failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

pub fn therapists_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/therapists/nearby", get(nearby))
        .route("/v1/therapists/:place_id", get(details))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lat: f64, lng: f64, radius_m: u32) -> NearbyQuery {
        NearbyQuery { lat, lng, radius_m }
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query(&query(40.4, -3.7, 5000)).is_ok());
        assert!(validate_query(&query(91.0, 0.0, 5000)).is_err());
        assert!(validate_query(&query(0.0, 181.0, 5000)).is_err());
        assert!(validate_query(&query(0.0, 0.0, 0)).is_err());
        assert!(validate_query(&query(0.0, 0.0, MAX_RADIUS_M + 1)).is_err());
    }
}
