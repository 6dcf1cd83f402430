use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use photoshare_shared::constants::SESSION_COOKIE;
use photoshare_shared::{PhotoId, UserId};
use serde::{Deserialize, Serialize};

use super::{AppState, JsonBody};
use crate::error::ServerError;
use crate::session::CurrentUser;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    login_name: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    id: UserId,
    first_name: String,
    login_name: String,
    token: String,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    id: UserId,
    first_name: String,
    last_name: String,
    login_name: String,
    favorites: Vec<PhotoId>,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let ok = state.mutations.login(&req.login_name, &req.password).await?;

    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        ok.token
    );
    let body = LoginResponse {
        id: ok.user.id,
        first_name: ok.user.first_name,
        login_name: ok.user.login_name,
        token: ok.token,
    };
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)))
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> impl IntoResponse {
    state.mutations.logout(current.id, &current.token).await;

    let expired = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    (
        AppendHeaders([(SET_COOKIE, expired)]),
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
}

pub async fn current_user(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<CurrentUserResponse>, ServerError> {
    let id = current.id;
    let user = state
        .db
        .call(move |db| {
            db.find_user(id)?
                .ok_or_else(|| ServerError::NotFound("User not found".to_string()))
        })
        .await?;

    Ok(Json(CurrentUserResponse {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        login_name: user.login_name,
        favorites: user.favorites,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{request, TestApp};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let app = TestApp::new().await;
        let (id, token) = app.signup("alice", "Alice").await;

        let (status, me) = app.get("/admin/current-user", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], id.as_str());
        assert_eq!(me["login_name"], "alice");
        assert!(me.get("password_digest").is_none());

        let (status, _) = app.post("/admin/logout", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get("/admin/current-user", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let app = TestApp::new().await;
        app.signup("alice", "Alice").await;

        let (status, body) = app
            .post(
                "/admin/login",
                None,
                json!({ "login_name": "alice", "password": "nope" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_session_cookie_accepted() {
        let app = TestApp::new().await;
        let (_, token) = app.signup("alice", "Alice").await;

        let req = Request::builder()
            .uri("/admin/current-user")
            .header(header::COOKIE, format!("session={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(request("GET", "/admin/current-user", None, None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
