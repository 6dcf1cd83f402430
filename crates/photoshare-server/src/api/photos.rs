use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use photoshare_shared::constants::{
    UPLOAD_FIELD_FILE, UPLOAD_FIELD_VISIBILITY_ENABLED, UPLOAD_FIELD_VISIBLE_TO,
};
use photoshare_shared::{CommentId, PhotoId, UserId};
use photoshare_store::Photo;
use serde::Deserialize;
use tracing::info;

use super::{AppState, JsonBody};
use crate::error::ServerError;
use crate::services::aggregation::{
    self, CommentedPhoto, MentionedPhoto, PhotoView, RecentPhoto,
};
use crate::services::mutations::{LikeState, UploadRequest};
use crate::session::CurrentUser;

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    comment: String,
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    id: Option<String>,
}

fn parse_user(raw: &str) -> Result<UserId, ServerError> {
    UserId::parse(raw).map_err(|_| ServerError::BadRequest("Invalid user ID format".to_string()))
}

fn parse_photo(raw: &str) -> Result<PhotoId, ServerError> {
    PhotoId::parse(raw).map_err(|_| ServerError::NotFound("Photo not found".to_string()))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub async fn photos_of_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PhotoView>>, ServerError> {
    let owner = parse_user(&id)?;
    let viewer = current.id;
    let photos = state
        .db
        .call(move |db| aggregation::photos_of_user(db, viewer, owner))
        .await?;
    Ok(Json(photos))
}

pub async fn photo_of_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user, photo)): Path<(String, String)>,
) -> Result<Json<PhotoView>, ServerError> {
    let owner = UserId::parse(&user)
        .map_err(|_| ServerError::NotFound("Photo not found".to_string()))?;
    let photo = parse_photo(&photo)?;
    let viewer = current.id;
    let view = state
        .db
        .call(move |db| aggregation::photo_of_user(db, viewer, owner, photo))
        .await?;
    Ok(Json(view))
}

pub async fn recent_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<RecentPhoto>, ServerError> {
    let owner = parse_user(&id)?;
    let viewer = current.id;
    let result = state
        .db
        .call(move |db| aggregation::most_recent_photo(db, viewer, owner))
        .await?;
    Ok(Json(result))
}

pub async fn most_commented_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CommentedPhoto>, ServerError> {
    let owner = parse_user(&id)?;
    let viewer = current.id;
    let result = state
        .db
        .call(move |db| aggregation::most_commented_photo(db, viewer, owner))
        .await?;
    Ok(Json(result))
}

pub async fn mentions_of_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<MentionedPhoto>>, ServerError> {
    let target = parse_user(&id)?;
    let viewer = current.id;
    let photos = state
        .db
        .call(move |db| aggregation::mentions_of_user(db, viewer, target))
        .await?;
    Ok(Json(photos))
}

pub async fn image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let data = state.blobs.read(&name).await?;
    Ok(([(CONTENT_TYPE, content_type_for(&name))], data))
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

pub async fn add_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(photo): Path<String>,
    JsonBody(req): JsonBody<CommentRequest>,
) -> Result<Json<Photo>, ServerError> {
    let photo = parse_photo(&photo)?;
    let updated = state
        .mutations
        .add_comment(photo, &req.comment, current.id)
        .await?;
    Ok(Json(updated))
}

pub async fn upload(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut visible_to = Vec::new();
    let mut visibility_enabled = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            UPLOAD_FIELD_FILE => {
                let original = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await?;
                file = Some((original, data.to_vec()));
            }
            UPLOAD_FIELD_VISIBLE_TO => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    visible_to = serde_json::from_str::<Vec<UserId>>(&raw).map_err(|e| {
                        ServerError::BadRequest(format!("Invalid {UPLOAD_FIELD_VISIBLE_TO}: {e}"))
                    })?;
                }
            }
            UPLOAD_FIELD_VISIBILITY_ENABLED => {
                visibility_enabled = field.text().await?.trim() == "true";
            }
            _ => {}
        }
    }

    let Some((original_name, bytes)) = file else {
        return Err(ServerError::BadRequest("No file uploaded".to_string()));
    };

    let photo = state
        .mutations
        .upload_photo(
            current.id,
            UploadRequest {
                original_name,
                bytes,
                visibility_enabled,
                visible_to,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, ServerError> {
    let photo = parse_photo(&id)?;
    let like = state.mutations.toggle_like(photo, current.id).await?;
    Ok(Json(like))
}

/// `DELETE /delete/{photo|comment}` with the target id in the body.
pub async fn delete_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(action): Path<String>,
    JsonBody(req): JsonBody<DeleteRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Some(id) = req.id.filter(|id| !id.trim().is_empty()) else {
        return Err(ServerError::BadRequest("ID is required.".to_string()));
    };

    let message = match action.as_str() {
        "photo" => {
            let photo = PhotoId::parse(&id).map_err(|_| {
                ServerError::NotFound("Photo not found or unauthorized.".to_string())
            })?;
            state.mutations.delete_photo(photo, current.id).await?;
            "Photo deleted successfully."
        }
        "comment" => {
            let comment = CommentId::parse(&id).map_err(|_| {
                ServerError::NotFound("Comment not found or unauthorized.".to_string())
            })?;
            state.mutations.delete_comment(comment, current.id).await?;
            "Comment deleted successfully."
        }
        other => {
            info!(action = %other, "Rejected delete action");
            return Err(ServerError::BadRequest(
                "Invalid action. Must be 'photo' or 'comment'.".to_string(),
            ));
        }
    };

    Ok(Json(serde_json::json!({ "message": message })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::TestApp;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};

    const BOUNDARY: &str = "photoshare-test-boundary";

    fn multipart_body(file: &[u8], visibility_enabled: bool, visible_to: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"uploadedphoto\"; filename=\"cat.jpg\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(
            format!(
                "\r\n--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"visibilityEnabled\"\r\n\r\n\
                 {visibility_enabled}\r\n\
                 --{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"visibleTo\"\r\n\r\n\
                 {visible_to}\r\n\
                 --{BOUNDARY}--\r\n"
            )
            .as_bytes(),
        );
        body
    }

    async fn upload(app: &TestApp, token: &str, enabled: bool, visible_to: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/photos/new")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(b"jpeg-bytes", enabled, visible_to)))
            .unwrap();
        app.send(req).await
    }

    #[tokio::test]
    async fn test_upload_round_trip() {
        let app = TestApp::new().await;
        let (alice, token) = app.signup("alice", "Alice").await;

        let (status, photo) = upload(&app, &token, false, "[]").await;
        assert_eq!(status, StatusCode::CREATED);
        let file_name = photo["file_name"].as_str().unwrap().to_string();
        assert!(file_name.ends_with("-cat.jpg"));

        let (status, photos) = app.get(&format!("/photosOfUser/{alice}"), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(photos[0]["file_name"], file_name.as_str());

        let response = app
            .send(
                Request::builder()
                    .uri(format!("/images/{file_name}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.0, StatusCode::OK);
        assert_eq!(response.1, Value::String("jpeg-bytes".into()));
    }

    #[tokio::test]
    async fn test_private_upload_hidden_from_others() {
        let app = TestApp::new().await;
        let (alice, alice_token) = app.signup("alice", "Alice").await;
        let (_, bob_token) = app.signup("bob", "Bob").await;

        let (status, photo) = upload(&app, &alice_token, true, "[]").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(photo["visibility_toggle"], true);

        let uri = format!("/photosOfUser/{alice}");
        let (_, for_bob) = app.get(&uri, Some(&bob_token)).await;
        assert_eq!(for_bob, json!([]));
        let (_, for_alice) = app.get(&uri, Some(&alice_token)).await;
        assert_eq!(for_alice.as_array().unwrap().len(), 1);

        let (status, recent) = app
            .get(&format!("/recentPhotoOfUser/{alice}"), Some(&bob_token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recent, json!({ "status": "no_photos" }));
    }

    #[tokio::test]
    async fn test_upload_requires_file() {
        let app = TestApp::new().await;
        let (_, token) = app.signup("alice", "Alice").await;

        let (status, _) = upload(&app, &token, false, "[]").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = upload(&app, &token, true, "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/photos/new")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!("--{BOUNDARY}--\r\n")))
            .unwrap();
        let (status, _) = app.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comments_mentions_and_sentinel() {
        let app = TestApp::new().await;
        let (alice, alice_token) = app.signup("alice", "Alice").await;
        let (bob, bob_token) = app.signup("bob", "Bob").await;

        let (_, photo) = upload(&app, &alice_token, false, "[]").await;
        let photo_id = photo["id"].as_str().unwrap().to_string();

        let (status, sentinel) = app
            .get(&format!("/highlyCommentedPhoto/{alice}"), Some(&bob_token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sentinel, json!({ "status": "no_commented_photos" }));

        let uri = format!("/commentsOfPhoto/{photo_id}");
        let (status, _) = app.post(&uri, Some(&alice_token), json!({ "comment": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let text = format!("@[Bob]({bob}) nice!");
        let (status, updated) = app
            .post(&uri, Some(&alice_token), json!({ "comment": text }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["mentions"].as_array().unwrap().len(), 1);

        let (_, mentions) = app
            .get(&format!("/mentionsOfUser/{bob}"), Some(&bob_token))
            .await;
        assert_eq!(mentions[0]["id"], photo_id.as_str());
        assert_eq!(mentions[0]["owner"]["first_name"], "Alice");

        let (_, busiest) = app
            .get(&format!("/highlyCommentedPhoto/{alice}"), Some(&bob_token))
            .await;
        assert_eq!(busiest["status"], "found");
        assert_eq!(busiest["comments"][0]["user"]["first_name"], "Alice");

        let comment_id = updated["comments"][0]["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .delete("/delete/comment", Some(&bob_token), json!({ "id": comment_id }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .delete("/delete/comment", Some(&alice_token), json!({ "id": comment_id }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, mentions) = app
            .get(&format!("/mentionsOfUser/{bob}"), Some(&bob_token))
            .await;
        assert_eq!(mentions, json!([]));
    }

    #[tokio::test]
    async fn test_like_toggle_parity() {
        let app = TestApp::new().await;
        let (_, token) = app.signup("alice", "Alice").await;
        let (_, photo) = upload(&app, &token, false, "[]").await;
        let uri = format!("/photos/{}/like", photo["id"].as_str().unwrap());

        let (status, liked) = app.post(&uri, Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(liked["like_count"], 1);
        assert_eq!(liked["liked_by_user"], true);

        let (_, unliked) = app.post(&uri, Some(&token), json!({})).await;
        assert_eq!(unliked["like_count"], 0);
        assert_eq!(unliked["liked_by"], json!([]));

        let (status, _) = app.post(&uri, None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_actions() {
        let app = TestApp::new().await;
        let (_, alice_token) = app.signup("alice", "Alice").await;
        let (_, bob_token) = app.signup("bob", "Bob").await;
        let (_, photo) = upload(&app, &alice_token, false, "[]").await;
        let id = photo["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .delete("/delete/album", Some(&alice_token), json!({ "id": id }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.delete("/delete/photo", Some(&alice_token), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .delete("/delete/photo", Some(&bob_token), json!({ "id": id }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .delete("/delete/photo", Some(&alice_token), json!({ "id": id }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .get(&format!("/images/{}", photo["file_name"].as_str().unwrap()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
