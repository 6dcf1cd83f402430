use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Request, State},
    http::Method,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::database::DbHandle;
use crate::error::ServerError;
use crate::services::activity_log::ActivityLog;
use crate::services::mutations::MutationCoordinator;
use crate::session::SessionStore;

mod activities;
mod auth;
mod photos;
mod users;

#[derive(Clone)]
pub struct AppState {
    pub db: DbHandle,
    pub blobs: Arc<BlobStore>,
    pub sessions: SessionStore,
    pub activity: ActivityLog,
    pub mutations: Arc<MutationCoordinator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the collaborators together.
    pub fn new(
        db: DbHandle,
        blobs: Arc<BlobStore>,
        activity: ActivityLog,
        config: ServerConfig,
    ) -> Self {
        let sessions = SessionStore::new();
        let mutations = Arc::new(MutationCoordinator::new(
            db.clone(),
            blobs.clone(),
            activity.clone(),
            sessions.clone(),
        ));
        Self {
            db,
            blobs,
            sessions,
            activity,
            mutations,
            config: Arc::new(config),
        }
    }
}

/// `Json` whose rejections answer with the usual `{"error": …}` 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/test/counts", get(collection_counts))
        // sessions
        .route("/admin/login", post(auth::login))
        .route("/admin/logout", post(auth::logout))
        .route("/admin/current-user", get(auth::current_user))
        // users
        .route("/user", post(users::register))
        .route("/user/list", get(users::list))
        .route("/user/{id}", get(users::detail))
        .route("/delete-account/{id}", delete(users::delete_account))
        .route("/favorites", get(users::favorites))
        .route("/favorites/add", post(users::add_favorite))
        .route("/favorites/remove", post(users::remove_favorite))
        // photos
        .route("/photosOfUser/{id}", get(photos::photos_of_user))
        .route("/photosOfUser/{user}/{photo}", get(photos::photo_of_user))
        .route("/recentPhotoOfUser/{id}", get(photos::recent_photo))
        .route("/highlyCommentedPhoto/{id}", get(photos::most_commented_photo))
        .route("/mentionsOfUser/{id}", get(photos::mentions_of_user))
        .route("/commentsOfPhoto/{photo}", post(photos::add_comment))
        .route("/photos/new", post(photos::upload))
        .route("/photos/{id}/like", post(photos::toggle_like))
        .route("/images/{name}", get(photos::image))
        .route("/delete/{action}", delete(photos::delete_item))
        // activity
        .route("/activities", get(activities::recent))
        .route("/activities/live", get(activities::live))
        .route("/sidebar/{id}", get(activities::for_user))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct CountsResponse {
    user: u64,
    photo: u64,
    activity: u64,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn collection_counts(State(state): State<AppState>) -> Result<Json<CountsResponse>, ServerError> {
    let counts = state
        .db
        .call(|db| {
            Ok(CountsResponse {
                user: db.count_users()?,
                photo: db.count_photos()?,
                activity: db.count_activities()?,
            })
        })
        .await?;
    Ok(Json(counts))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router harness shared by the handler tests.

    use super::*;
    use crate::broadcast::ActivityBroadcaster;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use photoshare_store::Database;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub struct TestApp {
        pub state: AppState,
        pub router: Router,
        _dir: TempDir,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = ServerConfig {
                images_path: dir.path().join("images"),
                ..ServerConfig::default()
            };
            let db = DbHandle::new(Database::open_in_memory().unwrap());
            let blobs = Arc::new(
                BlobStore::new(config.images_path.clone(), config.max_upload_size)
                    .await
                    .unwrap(),
            );
            let activity = ActivityLog::new(db.clone(), ActivityBroadcaster::new(16));
            let state = AppState::new(db, blobs, activity, config);
            let router = build_router(state.clone());
            Self {
                state,
                router,
                _dir: dir,
            }
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
            };
            (status, body)
        }

        pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            self.send(request("GET", uri, token, None)).await
        }

        pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            self.send(request("POST", uri, token, Some(body))).await
        }

        pub async fn delete(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            self.send(request("DELETE", uri, token, Some(body))).await
        }

        /// Register and log in; returns `(user id, session token)`.
        pub async fn signup(&self, login: &str, first_name: &str) -> (String, String) {
            let (status, _) = self
                .post(
                    "/user",
                    None,
                    serde_json::json!({
                        "login_name": login,
                        "first_name": first_name,
                        "last_name": "Test",
                        "password": "pw1",
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);

            let (status, body) = self
                .post(
                    "/admin/login",
                    None,
                    serde_json::json!({ "login_name": login, "password": "pw1" }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            (
                body["id"].as_str().unwrap().to_string(),
                body["token"].as_str().unwrap().to_string(),
            )
        }
    }

    pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}
