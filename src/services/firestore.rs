// Firestore service
// Uses the Firestore REST API; documents are converted to and from plain JSON
// so models can be (de)serialized with serde.

use chrono::{DateTime, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::assessments::AssessmentKind;
use crate::models::{
    truncate_chars, ChatSession, DiaryEntry, GameKind, GameProgress, Message, NatureSound,
    TestResult, UserProfile, PREVIEW_LEN, TITLE_LEN,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service account credentials from JSON file
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: Option<String>,
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
struct GoogleJwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Firestore collection paths
pub const USERS_COLLECTION: &str = "users";
pub const CHAT_SESSIONS_SUBCOLLECTION: &str = "chat_sessions";
pub const MESSAGES_SUBCOLLECTION: &str = "messages";
pub const GAME_PROGRESS_SUBCOLLECTION: &str = "game_progress";
pub const DIARY_SUBCOLLECTION: &str = "diary_entries";
pub const NATURE_SOUNDS_COLLECTION: &str = "nature_sounds";

/// Max writes per commit request
const COMMIT_BATCH: usize = 500;

/// Firestore REST API client
pub struct FirestoreService {
    client: Client,
    project_id: String,
    credentials: Option<ServiceAccountCredentials>,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl FirestoreService {
    /// Create a new Firestore service
    pub async fn new(project_id: String) -> Result<Self, BoxError> {
        let credentials = Self::load_credentials()?;

        let service = Self {
            client: Client::new(),
            project_id,
            credentials,
            cached_token: Arc::new(RwLock::new(None)),
        };

        if let Err(e) = service.get_access_token().await {
            tracing::warn!("Failed to get initial access token: {}", e);
        }

        Ok(service)
    }

    /// Load service account credentials from GOOGLE_APPLICATION_CREDENTIALS
    fn load_credentials() -> Result<Option<ServiceAccountCredentials>, BoxError> {
        let creds_path = match std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            Ok(path) => path,
            Err(_) => {
                if std::path::Path::new("google-credentials.json").exists() {
                    "google-credentials.json".to_string()
                } else {
                    tracing::warn!("No GOOGLE_APPLICATION_CREDENTIALS set and no google-credentials.json found");
                    return Ok(None);
                }
            }
        };

        tracing::info!("Loading service account credentials from: {}", creds_path);

        let creds_json = std::fs::read_to_string(&creds_path)
            .map_err(|e| format!("Failed to read credentials file {}: {}", creds_path, e))?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&creds_json)
            .map_err(|e| format!("Failed to parse credentials JSON: {}", e))?;

        tracing::info!("Loaded credentials for service account: {}", credentials.client_email);
        Ok(Some(credentials))
    }

    /// Cached access token, refreshed when less than a minute remains
    async fn get_access_token(&self) -> Result<String, BoxError> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now().timestamp() + 60 {
                    return Ok(cached.token.clone());
                }
            }
        }

        let token = self.fetch_new_access_token().await?;

        // Tokens live an hour; refresh after 55 minutes
        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at: Utc::now().timestamp() + 3300,
        });

        Ok(token)
    }

    async fn fetch_new_access_token(&self) -> Result<String, BoxError> {
        if let Some(creds) = &self.credentials {
            let token = self.get_token_from_service_account(creds).await?;
            tracing::info!("Got access token from service account");
            return Ok(token);
        }

        if let Ok(token) = self.try_metadata_server().await {
            tracing::info!("Got access token from GCP metadata server");
            return Ok(token);
        }

        Err("No valid authentication method available. Set GOOGLE_APPLICATION_CREDENTIALS or run on GCP.".into())
    }

    /// Token from the GCP metadata server (Cloud Run / GKE)
    async fn try_metadata_server(&self) -> Result<String, BoxError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .client
            .get("http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token")
            .header("Metadata-Flavor", "Google")
            .timeout(std::time::Duration::from_secs(2))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err("Metadata server not available".into());
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// OAuth2 JWT-bearer flow with the service account key
    async fn get_token_from_service_account(
        &self,
        creds: &ServiceAccountCredentials,
    ) -> Result<String, BoxError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let now = Utc::now().timestamp();
        let token_uri = creds
            .token_uri
            .as_deref()
            .unwrap_or("https://oauth2.googleapis.com/token");

        let claims = GoogleJwtClaims {
            iss: creds.client_email.clone(),
            scope: "https://www.googleapis.com/auth/datastore".to_string(),
            aud: token_uri.to_string(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
            .map_err(|e| format!("Failed to parse private key: {}", e))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| format!("Failed to encode JWT: {}", e))?;

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| format!("Token request failed: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Token exchange failed: {}", error_text).into());
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse token response: {}", e))?;

        Ok(token_response.access_token)
    }

    /// Firestore REST API base URL
    fn base_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    /// Full resource name of a document (used in commit writes)
    fn document_name(&self, path: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}",
            self.project_id, path
        )
    }

    async fn build_request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, BoxError> {
        let token = self.get_access_token().await?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    // =========================================================================
    // GENERIC DOCUMENT OPERATIONS
    // =========================================================================

    /// Fetch and decode a document; `None` when it does not exist
    async fn get_document<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BoxError> {
        let url = format!("{}/{}", self.base_url(), path);

        let response = self
            .build_request(reqwest::Method::GET, &url)
            .await?
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Firestore error: {}", error_text).into());
        }

        let doc: Value = response.json().await?;
        Ok(Some(serde_json::from_value(decode_document(&doc))?))
    }

    /// Write a whole document, replacing any existing one. An `id` field on
    /// the model is not stored since it is the document name.
    async fn set_document<T: Serialize>(&self, path: &str, model: &T) -> Result<(), BoxError> {
        let mut value = serde_json::to_value(model)?;
        let fields = match value.as_object_mut() {
            Some(map) => {
                map.remove("id");
                encode_fields(map)
            }
            None => return Err("Firestore documents must be objects".into()),
        };

        let url = format!("{}/{}", self.base_url(), path);
        let response = self
            .build_request(reqwest::Method::PATCH, &url)
            .await?
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Firestore save error: {}", error_text).into());
        }

        Ok(())
    }

    /// Partial update of the listed fields. `fields` is a plain JSON object.
    async fn patch_fields(&self, path: &str, fields: Value, update_mask: &[&str]) -> Result<(), BoxError> {
        let mask_params = update_mask
            .iter()
            .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}/{}?{}", self.base_url(), path, mask_params);
        let encoded = match fields.as_object() {
            Some(map) => encode_fields(map),
            None => return Err("Field update must be an object".into()),
        };

        let response = self
            .build_request(reqwest::Method::PATCH, &url)
            .await?
            .json(&json!({ "fields": encoded }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Firestore update error: {}", error_text).into());
        }

        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), BoxError> {
        let url = format!("{}/{}", self.base_url(), path);

        let response = self
            .build_request(reqwest::Method::DELETE, &url)
            .await?
            .send()
            .await?;

        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let error_text = response.text().await?;
            return Err(format!("Firestore delete error: {}", error_text).into());
        }

        Ok(())
    }

    /// Delete many documents with batched commit requests
    async fn delete_documents(&self, paths: &[String]) -> Result<(), BoxError> {
        let url = format!("{}:commit", self.base_url());

        for chunk in paths.chunks(COMMIT_BATCH) {
            let writes: Vec<Value> = chunk
                .iter()
                .map(|p| json!({ "delete": self.document_name(p) }))
                .collect();

            let response = self
                .build_request(reqwest::Method::POST, &url)
                .await?
                .json(&json!({ "writes": writes }))
                .send()
                .await?;

            if !response.status().is_success() {
                let error_text = response.text().await?;
                return Err(format!("Firestore commit error: {}", error_text).into());
            }
        }

        Ok(())
    }

    /// Run a structured query under `parent` ("" for the database root)
    async fn run_query<T: DeserializeOwned>(
        &self,
        parent: &str,
        structured_query: Value,
    ) -> Result<Vec<T>, BoxError> {
        let url = if parent.is_empty() {
            format!("{}:runQuery", self.base_url())
        } else {
            format!("{}/{}:runQuery", self.base_url(), parent)
        };

        tracing::debug!(
            "Firestore query: {}",
            serde_json::to_string(&structured_query).unwrap_or_default()
        );

        let response = self
            .build_request(reqwest::Method::POST, &url)
            .await?
            .json(&json!({ "structuredQuery": structured_query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            tracing::error!("Firestore query error: {}", error_text);
            return Err(format!("Firestore query failed: {}", error_text).into());
        }

        let results: Vec<Value> = response.json().await?;
        let items = results
            .iter()
            .filter_map(|r| r.get("document"))
            .filter_map(|doc| match serde_json::from_value(decode_document(doc)) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Failed to parse document: {}", e);
                    None
                }
            })
            .collect();

        Ok(items)
    }

    /// Count documents in a collection with an aggregation query
    async fn count_documents(&self, parent: &str, collection: &str) -> Result<i64, BoxError> {
        let url = format!("{}/{}:runAggregationQuery", self.base_url(), parent);
        let query = json!({
            "structuredAggregationQuery": {
                "structuredQuery": { "from": [{"collectionId": collection}] },
                "aggregations": [{ "alias": "count", "count": {} }]
            }
        });

        let response = self
            .build_request(reqwest::Method::POST, &url)
            .await?
            .json(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            tracing::error!("Firestore aggregation query error: {}", error_text);
            return Err(format!("Firestore aggregation query failed: {}", error_text).into());
        }

        // [{"result": {"aggregateFields": {"count": {"integerValue": "123"}}}}]
        let results: Vec<Value> = response.json().await?;
        let count = results
            .first()
            .and_then(|r| r.pointer("/result/aggregateFields/count/integerValue"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);

        Ok(count)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    fn user_path(uid: &str) -> String {
        format!("{}/{}", USERS_COLLECTION, uid)
    }

    /// Get the user profile, creating an empty one on first access
    pub async fn get_or_create_user_profile(&self, uid: &str) -> Result<UserProfile, BoxError> {
        if let Some(mut profile) = self.get_document::<UserProfile>(&Self::user_path(uid)).await? {
            profile.id = uid.to_string();
            return Ok(profile);
        }

        let profile = UserProfile::new(uid);
        self.set_document(&Self::user_path(uid), &profile).await?;
        tracing::info!("Created profile for user {}", uid);
        Ok(profile)
    }

    pub async fn save_user_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), BoxError> {
        self.set_document(&Self::user_path(uid), profile).await
    }

    pub async fn update_user_profile(
        &self,
        uid: &str,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserProfile, BoxError> {
        let mut fields = Map::new();
        if let Some(name) = name {
            fields.insert("name".to_string(), json!(name));
        }
        if let Some(avatar) = avatar {
            fields.insert("avatar".to_string(), json!(avatar));
        }

        if !fields.is_empty() {
            // Make sure the document exists so the patch does not create a bare one
            self.get_or_create_user_profile(uid).await?;
            let mask: Vec<String> = fields.keys().cloned().collect();
            let mask: Vec<&str> = mask.iter().map(|s| s.as_str()).collect();
            self.patch_fields(&Self::user_path(uid), Value::Object(fields), &mask)
                .await?;
        }

        self.get_or_create_user_profile(uid).await
    }

    pub async fn update_user_language(&self, uid: &str, language: &str) -> Result<(), BoxError> {
        self.get_or_create_user_profile(uid).await?;
        self.patch_fields(
            &Self::user_path(uid),
            json!({ "language": language }),
            &["language"],
        )
        .await?;
        tracing::info!("Updated language for user {} to {}", uid, language);
        Ok(())
    }

    // =========================================================================
    // CHAT SESSIONS
    // =========================================================================

    fn sessions_path(uid: &str) -> String {
        format!("{}/{}", Self::user_path(uid), CHAT_SESSIONS_SUBCOLLECTION)
    }

    fn session_path(uid: &str, session_id: &str) -> String {
        format!("{}/{}", Self::sessions_path(uid), session_id)
    }

    /// Sessions ordered by most recent activity
    pub async fn list_chat_sessions(&self, uid: &str, limit: usize) -> Result<Vec<ChatSession>, BoxError> {
        let query = json!({
            "from": [{"collectionId": CHAT_SESSIONS_SUBCOLLECTION}],
            "orderBy": [{"field": {"fieldPath": "updated_at"}, "direction": "DESCENDING"}],
            "limit": limit
        });
        self.run_query(&Self::user_path(uid), query).await
    }

    pub async fn get_chat_session(&self, uid: &str, session_id: &str) -> Result<Option<ChatSession>, BoxError> {
        self.get_document(&Self::session_path(uid, session_id)).await
    }

    pub async fn create_chat_session(&self, uid: &str, session: &ChatSession) -> Result<(), BoxError> {
        self.set_document(&Self::session_path(uid, &session.id), session)
            .await?;
        tracing::info!("Created chat session {} for user {}", session.id, uid);
        Ok(())
    }

    pub async fn rename_chat_session(&self, uid: &str, session_id: &str, title: &str) -> Result<(), BoxError> {
        self.patch_fields(
            &Self::session_path(uid, session_id),
            json!({ "title": title, "default_title": false, "updated_at": Utc::now() }),
            &["title", "default_title", "updated_at"],
        )
        .await
    }

    /// Delete a session together with all of its messages
    pub async fn delete_chat_session(&self, uid: &str, session_id: &str) -> Result<usize, BoxError> {
        let session_path = Self::session_path(uid, session_id);
        let mut paths = Vec::new();

        loop {
            let query = json!({
                "from": [{"collectionId": MESSAGES_SUBCOLLECTION}],
                "select": {"fields": [{"fieldPath": "__name__"}]},
                "limit": COMMIT_BATCH,
                "offset": paths.len()
            });
            let page: Vec<Value> = self.run_query(&session_path, query).await?;
            let page_len = page.len();
            paths.extend(page.iter().filter_map(|doc| {
                doc.get("id")
                    .and_then(|id| id.as_str())
                    .map(|id| format!("{}/{}/{}", session_path, MESSAGES_SUBCOLLECTION, id))
            }));
            if page_len < COMMIT_BATCH {
                break;
            }
        }

        let deleted = paths.len();
        paths.push(session_path);
        self.delete_documents(&paths).await?;

        tracing::info!(
            "Deleted chat session {} ({} messages) for user {}",
            session_id,
            deleted,
            uid
        );
        Ok(deleted)
    }

    /// Latest `limit` messages of a session, oldest first
    pub async fn get_messages(&self, uid: &str, session_id: &str, limit: usize) -> Result<Vec<Message>, BoxError> {
        let query = json!({
            "from": [{"collectionId": MESSAGES_SUBCOLLECTION}],
            "orderBy": [{"field": {"fieldPath": "created_at"}, "direction": "DESCENDING"}],
            "limit": limit
        });
        let mut messages: Vec<Message> = self
            .run_query(&Self::session_path(uid, session_id), query)
            .await?;
        messages.reverse();
        Ok(messages)
    }

    /// Append a message and refresh the session's denormalized fields.
    /// The message count is recounted from the sub-collection.
    pub async fn add_message(
        &self,
        uid: &str,
        session: &ChatSession,
        message: &Message,
    ) -> Result<ChatSession, BoxError> {
        let session_path = Self::session_path(uid, &session.id);
        let message_path = format!("{}/{}/{}", session_path, MESSAGES_SUBCOLLECTION, message.id);

        self.set_document(&message_path, message).await?;
        let message_count = self
            .count_documents(&session_path, MESSAGES_SUBCOLLECTION)
            .await?;

        let mut updated = session.clone();
        updated.message_count = message_count;
        updated.last_message = Some(truncate_chars(&message.text, PREVIEW_LEN));
        updated.updated_at = message.created_at;

        let mut mask = vec!["message_count", "last_message", "updated_at"];
        if session.default_title && message.is_user {
            updated.title = truncate_chars(&message.text, TITLE_LEN);
            updated.default_title = false;
            mask.extend(["title", "default_title"]);
        }

        let fields = json!({
            "message_count": updated.message_count,
            "last_message": updated.last_message,
            "updated_at": updated.updated_at,
            "title": updated.title,
            "default_title": updated.default_title,
        });
        self.patch_fields(&session_path, fields, &mask).await?;

        Ok(updated)
    }

    // =========================================================================
    // ASSESSMENT RESULTS
    // =========================================================================

    pub async fn create_test_result(&self, result: &TestResult) -> Result<(), BoxError> {
        let path = format!("{}/{}", result.kind.collection(), result.id);
        self.set_document(&path, result).await?;
        tracing::info!(
            "Stored {} result {} for user {} (score {})",
            result.kind.as_str(),
            result.id,
            result.uid,
            result.score
        );
        Ok(())
    }

    /// A user's results of one kind, newest first
    pub async fn list_test_results(
        &self,
        uid: &str,
        kind: AssessmentKind,
        limit: usize,
    ) -> Result<Vec<TestResult>, BoxError> {
        let query = json!({
            "from": [{"collectionId": kind.collection()}],
            "where": field_filter("uid", "EQUAL", json!({"stringValue": uid})),
            "orderBy": [{"field": {"fieldPath": "created_at"}, "direction": "DESCENDING"}],
            "limit": limit
        });
        self.run_query("", query).await
    }

    pub async fn get_test_result(&self, kind: AssessmentKind, id: &str) -> Result<Option<TestResult>, BoxError> {
        self.get_document(&format!("{}/{}", kind.collection(), id))
            .await
    }

    pub async fn delete_test_result(&self, kind: AssessmentKind, id: &str) -> Result<(), BoxError> {
        self.delete_document(&format!("{}/{}", kind.collection(), id))
            .await?;
        tracing::info!("Deleted {} result {}", kind.as_str(), id);
        Ok(())
    }

    // =========================================================================
    // GAME PROGRESS
    // =========================================================================

    fn game_progress_path(uid: &str, game: GameKind) -> String {
        format!(
            "{}/{}/{}",
            Self::user_path(uid),
            GAME_PROGRESS_SUBCOLLECTION,
            game.as_str()
        )
    }

    /// Progress for a game; a fresh record when none is stored
    pub async fn get_game_progress(&self, uid: &str, game: GameKind) -> Result<GameProgress, BoxError> {
        Ok(self
            .get_document(&Self::game_progress_path(uid, game))
            .await?
            .unwrap_or_default())
    }

    pub async fn save_game_progress(
        &self,
        uid: &str,
        game: GameKind,
        progress: &GameProgress,
    ) -> Result<(), BoxError> {
        self.set_document(&Self::game_progress_path(uid, game), progress)
            .await
    }

    // =========================================================================
    // DIARY
    // =========================================================================

    fn diary_path(uid: &str) -> String {
        format!("{}/{}", Self::user_path(uid), DIARY_SUBCOLLECTION)
    }

    pub async fn create_diary_entry(&self, uid: &str, entry: &DiaryEntry) -> Result<(), BoxError> {
        self.set_document(&format!("{}/{}", Self::diary_path(uid), entry.id), entry)
            .await?;
        tracing::info!("Created diary entry {} for user {}", entry.id, uid);
        Ok(())
    }

    /// Entries between `from` and `to` (inclusive, by entry date), newest first
    pub async fn list_diary_entries(
        &self,
        uid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<DiaryEntry>, BoxError> {
        let mut filters = Vec::new();
        if let Some(from) = from {
            filters.push(field_filter(
                "entry_date",
                "GREATER_THAN_OR_EQUAL",
                json!({"stringValue": from.to_string()}),
            ));
        }
        if let Some(to) = to {
            filters.push(field_filter(
                "entry_date",
                "LESS_THAN_OR_EQUAL",
                json!({"stringValue": to.to_string()}),
            ));
        }

        let mut query = json!({
            "from": [{"collectionId": DIARY_SUBCOLLECTION}],
            "orderBy": [
                {"field": {"fieldPath": "entry_date"}, "direction": "DESCENDING"},
                {"field": {"fieldPath": "created_at"}, "direction": "DESCENDING"}
            ],
            "limit": limit
        });
        if let Some(where_filter) = where_clause(filters) {
            query["where"] = where_filter;
        }

        self.run_query(&Self::user_path(uid), query).await
    }

    pub async fn get_diary_entry(&self, uid: &str, entry_id: &str) -> Result<Option<DiaryEntry>, BoxError> {
        self.get_document(&format!("{}/{}", Self::diary_path(uid), entry_id))
            .await
    }

    pub async fn delete_diary_entry(&self, uid: &str, entry_id: &str) -> Result<(), BoxError> {
        self.delete_document(&format!("{}/{}", Self::diary_path(uid), entry_id))
            .await?;
        tracing::info!("Deleted diary entry {} for user {}", entry_id, uid);
        Ok(())
    }

    // =========================================================================
    // NATURE SOUNDS
    // =========================================================================

    pub async fn list_nature_sounds(&self, category: Option<&str>) -> Result<Vec<NatureSound>, BoxError> {
        let mut query = json!({
            "from": [{"collectionId": NATURE_SOUNDS_COLLECTION}],
            "orderBy": [{"field": {"fieldPath": "title"}, "direction": "ASCENDING"}]
        });
        if let Some(category) = category {
            query["where"] = field_filter("category", "EQUAL", json!({"stringValue": category}));
        }
        self.run_query("", query).await
    }
}

// =============================================================================
// QUERY HELPERS
// =============================================================================

fn field_filter(field: &str, op: &str, value: Value) -> Value {
    json!({
        "fieldFilter": {
            "field": {"fieldPath": field},
            "op": op,
            "value": value
        }
    })
}

/// Combine filters: none, a single filter, or an AND composite
fn where_clause(mut filters: Vec<Value>) -> Option<Value> {
    match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(json!({
            "compositeFilter": {
                "op": "AND",
                "filters": filters
            }
        })),
    }
}

// =============================================================================
// VALUE ENCODING
// =============================================================================

/// Strings under these keys are stored as Firestore timestamps
fn is_timestamp_key(key: &str) -> bool {
    key == "at" || key.ends_with("_at")
}

/// Encode a plain JSON object as a Firestore `fields` map
pub fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(k, v)))
        .collect();
    Value::Object(fields)
}

fn encode_value(key: &str, value: &Value) -> Value {
    match value {
        Value::Null => json!({"nullValue": null}),
        Value::Bool(b) => json!({"booleanValue": b}),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({"integerValue": i.to_string()})
            } else if let Some(u) = n.as_u64() {
                json!({"integerValue": u.to_string()})
            } else {
                json!({"doubleValue": n.as_f64()})
            }
        }
        Value::String(s) => {
            if is_timestamp_key(key) && DateTime::parse_from_rfc3339(s).is_ok() {
                json!({"timestampValue": s})
            } else {
                json!({"stringValue": s})
            }
        }
        Value::Array(items) => json!({
            "arrayValue": {
                "values": items.iter().map(|v| encode_value("", v)).collect::<Vec<_>>()
            }
        }),
        Value::Object(map) => json!({"mapValue": {"fields": encode_fields(map)}}),
    }
}

/// Decode a Firestore document into a plain JSON object with an `id` field
/// taken from the last segment of the document name
pub fn decode_document(doc: &Value) -> Value {
    let mut object = match doc.get("fields") {
        Some(fields) => decode_fields(fields),
        None => Map::new(),
    };

    if let Some(id) = doc
        .get("name")
        .and_then(|n| n.as_str())
        .and_then(|n| n.rsplit('/').next())
    {
        object.insert("id".to_string(), Value::String(id.to_string()));
    }

    Value::Object(object)
}

fn decode_fields(fields: &Value) -> Map<String, Value> {
    fields
        .as_object()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default()
}

fn decode_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue") {
        return s.clone();
    }
    if let Some(s) = value.get("timestampValue") {
        return s.clone();
    }
    if let Some(b) = value.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = value.get("integerValue") {
        // Integers arrive as decimal strings
        return match i {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(d) = value.get("doubleValue") {
        return d.clone();
    }
    if let Some(map) = value.get("mapValue") {
        return Value::Object(map.get("fields").map(decode_fields).unwrap_or_default());
    }
    if let Some(array) = value.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityCategory, RecentActivity};

    #[test]
    fn test_encode_scalars_and_timestamps() {
        let input = json!({
            "name": "Sam",
            "count": 3,
            "ratio": 0.5,
            "ok": true,
            "none": null,
            "created_at": "2024-03-10T12:00:00Z",
            "note": "2024-03-10T12:00:00Z"
        });
        let fields = encode_fields(input.as_object().unwrap());

        assert_eq!(fields["name"], json!({"stringValue": "Sam"}));
        assert_eq!(fields["count"], json!({"integerValue": "3"}));
        assert_eq!(fields["ratio"], json!({"doubleValue": 0.5}));
        assert_eq!(fields["ok"], json!({"booleanValue": true}));
        assert_eq!(fields["none"], json!({"nullValue": null}));
        assert_eq!(fields["created_at"], json!({"timestampValue": "2024-03-10T12:00:00Z"}));
        // Only *_at keys become timestamps
        assert_eq!(fields["note"], json!({"stringValue": "2024-03-10T12:00:00Z"}));
    }

    #[test]
    fn test_decode_document_with_nested_values() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/users/u1/game_progress/connect_dots",
            "fields": {
                "unlocked_level": {"integerValue": "4"},
                "completed_levels": {"arrayValue": {"values": [
                    {"integerValue": "1"}, {"integerValue": "2"}, {"integerValue": "3"}
                ]}},
                "best_moves": {"mapValue": {"fields": {"1": {"integerValue": "12"}}}},
                "best_times": {"mapValue": {}}
            }
        });

        let decoded = decode_document(&doc);
        assert_eq!(decoded["id"], "connect_dots");

        let progress: GameProgress = serde_json::from_value(decoded).unwrap();
        assert_eq!(progress.unlocked_level, 4);
        assert_eq!(progress.completed_levels.len(), 3);
        assert_eq!(progress.best_moves[&1], 12);
        assert!(progress.best_times.is_empty());
    }

    #[test]
    fn test_profile_survives_encode_decode() {
        let mut profile = UserProfile::new("u1");
        profile.name = Some("Sam".to_string());
        profile.record_activity(RecentActivity {
            category: ActivityCategory::Diary,
            title: "Wrote".to_string(),
            at: "2024-03-10T12:00:00Z".parse().unwrap(),
        });

        let mut value = serde_json::to_value(&profile).unwrap();
        value.as_object_mut().unwrap().remove("id");
        let fields = encode_fields(value.as_object().unwrap());
        assert_eq!(
            fields["recent_activities"]["arrayValue"]["values"][0]["mapValue"]["fields"]["at"],
            json!({"timestampValue": "2024-03-10T12:00:00Z"})
        );

        let doc = json!({"name": "projects/p/databases/(default)/documents/users/u1", "fields": fields});
        let decoded: UserProfile = serde_json::from_value(decode_document(&doc)).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_where_clause_shapes() {
        assert!(where_clause(vec![]).is_none());
        let single = where_clause(vec![field_filter("a", "EQUAL", json!({"stringValue": "x"}))]).unwrap();
        assert!(single.get("fieldFilter").is_some());
        let both = where_clause(vec![
            field_filter("a", "EQUAL", json!({"stringValue": "x"})),
            field_filter("b", "EQUAL", json!({"stringValue": "y"})),
        ])
        .unwrap();
        assert_eq!(both["compositeFilter"]["filters"].as_array().unwrap().len(), 2);
    }
}
