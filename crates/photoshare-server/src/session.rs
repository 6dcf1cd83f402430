//! Session boundary.
//!
//! Logged-in users hold an opaque token, sent back either as
//! `Authorization: Bearer <token>` or as the `session` cookie. Tokens live in
//! memory only; a restart logs everybody out.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use photoshare_shared::constants::SESSION_COOKIE;
use photoshare_shared::UserId;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use crate::api::AppState;
use crate::error::ServerError;

const TOKEN_BYTES: usize = 32;

#[derive(Clone, Default)]
pub struct SessionStore {
    /// token -> logged-in user
    sessions: Arc<RwLock<HashMap<String, UserId>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `user` and return its token.
    pub async fn create(&self, user: UserId) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.sessions.write().await.insert(token.clone(), user);
        debug!(user = %user, "Session opened");
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.read().await.get(token).copied()
    }

    /// Close one session. Returns `false` for an unknown token.
    pub async fn destroy(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Close every session of `user`. Returns how many were closed.
    pub async fn destroy_user(&self, user: UserId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, owner| *owner != user);
        before - sessions.len()
    }
}

/// Pull the session token out of the request headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The authenticated caller. Rejects the request with 401 when there is no
/// live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ServerError::Unauthenticated)?;
        let id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or(ServerError::Unauthenticated)?;
        Ok(Self { id, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_create_resolve_destroy() {
        let store = SessionStore::new();
        let alice = UserId::new();

        let token = store.create(alice).await;
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert_eq!(store.resolve(&token).await, Some(alice));

        assert!(store.destroy(&token).await);
        assert!(!store.destroy(&token).await);
        assert_eq!(store.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn test_destroy_user_closes_all_sessions() {
        let store = SessionStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        store.create(alice).await;
        store.create(alice).await;
        let bob_token = store.create(bob).await;

        assert_eq!(store.destroy_user(alice).await, 2);
        assert_eq!(store.resolve(&bob_token).await, Some(bob));
    }

    #[test]
    fn test_token_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc123"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }
}
