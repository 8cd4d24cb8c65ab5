// Firebase Authentication
// Verifies Firebase ID tokens (RS256) against Google's published JWKS.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Extension,
};
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Refetch keys after this many seconds even when the kid is known
const KEYS_MAX_AGE_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// Claims we read from a Firebase ID token
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: i64,
}

/// Firebase ID token verifier
pub struct FirebaseAuth {
    project_id: String,
    client: reqwest::Client,
    keys: RwLock<KeySet>,
}

impl FirebaseAuth {
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            client: reqwest::Client::new(),
            keys: RwLock::new(KeySet {
                keys: HashMap::new(),
                fetched_at: 0,
            }),
        }
    }

    /// Fetch the current signing keys
    pub async fn refresh_keys(&self) -> Result<(), BoxError> {
        let jwks: Jwks = self
            .client
            .get(JWKS_URL)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => tracing::warn!("Skipping invalid Firebase key {}: {}", jwk.kid, e),
            }
        }

        tracing::info!("Loaded {} Firebase signing keys", keys.len());
        let mut set = self.keys.write().await;
        *set = KeySet {
            keys,
            fetched_at: Utc::now().timestamp(),
        };
        Ok(())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation
    }

    /// Verify an ID token and return the user it belongs to
    pub async fn verify_token(&self, token: &str) -> Result<AuthUser, BoxError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or("Token has no key id")?;

        let stale = {
            let set = self.keys.read().await;
            !set.keys.contains_key(&kid)
                || Utc::now().timestamp() - set.fetched_at > KEYS_MAX_AGE_SECS
        };
        if stale {
            if let Err(e) = self.refresh_keys().await {
                tracing::warn!("Failed to refresh Firebase keys: {}", e);
            }
        }

        let set = self.keys.read().await;
        let key = set.keys.get(&kid).ok_or("Unknown signing key")?;
        let data = decode::<FirebaseClaims>(token, key, &self.validation())?;

        if data.claims.sub.is_empty() {
            return Err("Token has no subject".into());
        }

        Ok(AuthUser {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Layer that makes the verifier available to the `AuthUser` extractor
pub fn firebase_auth_extension(auth: Arc<FirebaseAuth>) -> Extension<Arc<FirebaseAuth>> {
    Extension(auth)
}

/// Authenticated caller, extracted from `Authorization: Bearer <id token>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<FirebaseAuth>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("FirebaseAuth extension missing");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

        let token = bearer_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        auth.verify_token(token).await.map_err(|e| {
            tracing::warn!("Rejected token: {}", e);
            StatusCode::UNAUTHORIZED
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/v1/users/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut parts = parts_with(None);
        parts
            .extensions
            .insert(Arc::new(FirebaseAuth::new("test-project".to_string())));
        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let auth = FirebaseAuth::new("test-project".to_string());
        assert!(auth.verify_token("not-a-jwt").await.is_err());
    }
}
