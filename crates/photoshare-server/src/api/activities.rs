use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use futures::{SinkExt, StreamExt};
use photoshare_shared::constants::EVENT_NEW_ACTIVITY;
use photoshare_shared::UserId;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::ServerError;
use crate::services::activity_log::ActivityEvent;

/// One frame on the live activity socket.
#[derive(Serialize)]
struct LiveFrame<'a> {
    event: &'static str,
    data: &'a ActivityEvent,
}

fn live_frame(event: &ActivityEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&LiveFrame {
        event: EVENT_NEW_ACTIVITY,
        data: event,
    })
}

pub async fn recent(State(state): State<AppState>) -> Result<Json<Vec<ActivityEvent>>, ServerError> {
    let events = state
        .activity
        .list_recent(state.config.activity_feed_limit)
        .await?;
    Ok(Json(events))
}

pub async fn for_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityEvent>>, ServerError> {
    let user = UserId::parse(&id)?;
    Ok(Json(state.activity.list_for_user(user).await?))
}

/// Upgrade to a WebSocket that receives every activity recorded from now on.
pub async fn live(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let broadcaster = state.activity.broadcaster();
    let rx = broadcaster.subscribe();
    info!(
        subscribers = broadcaster.subscriber_count(),
        "Live activity subscriber connected"
    );
    ws.on_upgrade(move |socket| forward_activities(socket, rx))
}

async fn forward_activities(socket: WebSocket, mut rx: broadcast::Receiver<ActivityEvent>) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    let frame = match live_frame(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode activity frame");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live subscriber lagged, dropping activities");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Live activity subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::TestApp;
    use axum::http::StatusCode;
    use photoshare_shared::ActivityKind;
    use photoshare_store::Activity;
    use serde_json::Value;

    #[test]
    fn test_live_frame_shape() {
        let event = ActivityEvent {
            activity: Activity::new(ActivityKind::UserLogin, UserId::new(), None, None),
            user_name: "Alice".into(),
            photo_file_name: None,
        };
        let frame: Value = serde_json::from_str(&live_frame(&event).unwrap()).unwrap();
        assert_eq!(frame["event"], "new-activity");
        assert_eq!(frame["data"]["user_name"], "Alice");
        assert_eq!(frame["data"]["user_id"], event.activity.user_id.to_string());
    }

    #[tokio::test]
    async fn test_recent_feed_is_limited_and_newest_first() {
        let app = TestApp::new().await;
        app.signup("alice", "Alice").await;
        let (_, token) = app.signup("bob", "Bob").await;
        let (status, _) = app
            .post("/admin/logout", Some(&token), serde_json::json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, feed) = app.get("/activities", None).await;
        assert_eq!(status, StatusCode::OK);
        let feed = feed.as_array().unwrap();
        assert_eq!(feed.len(), 5);
        assert_eq!(feed[0]["user_name"], "Bob");
        assert!(feed[0]["date_time"].as_str() >= feed[4]["date_time"].as_str());
    }

    #[tokio::test]
    async fn test_sidebar_lists_one_user() {
        let app = TestApp::new().await;
        let (alice, _) = app.signup("alice", "Alice").await;
        app.signup("bob", "Bob").await;

        let (status, entries) = app.get(&format!("/sidebar/{alice}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["user_id"] == alice.as_str()));

        let (status, _) = app.get("/sidebar/nope", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_new_activity_reaches_subscriber() {
        let app = TestApp::new().await;
        let mut rx = app.state.activity.broadcaster().subscribe();
        app.signup("alice", "Alice").await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.activity.kind, ActivityKind::UserRegistration);
        assert_eq!(first.user_name, "Alice");
    }
}
