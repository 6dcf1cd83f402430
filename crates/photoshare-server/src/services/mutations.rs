//! Mutation coordinator.
//!
//! Every write path goes through here: the record change itself, the
//! dependent clean-up it implies, and the activity entry it produces.
//! Collaborators are handed in at construction.

use std::sync::Arc;

use chrono::Utc;
use photoshare_shared::crypto::{does_password_match, make_password_entry};
use photoshare_shared::{ActivityKind, CommentId, PhotoId, UserId, Visibility};
use photoshare_store::{AccountDeletion, Photo, StoreError, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::blob_store::{stored_file_name, BlobStore};
use crate::database::DbHandle;
use crate::error::ServerError;
use crate::services::activity_log::ActivityLog;
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// Inputs and outcomes
// ---------------------------------------------------------------------------

/// Registration form. Every field is optional on the wire so that missing
/// fields surface as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub login_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occupation: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new account was created.
    Created(User),
    /// A pre-seeded account without a credential received one.
    Claimed(User),
}

impl RegisterOutcome {
    pub fn user(&self) -> &User {
        match self {
            RegisterOutcome::Created(user) | RegisterOutcome::Claimed(user) => user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LikeState {
    pub like_count: u32,
    pub liked_by: Vec<UserId>,
    pub liked_by_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub original_name: String,
    pub bytes: Vec<u8>,
    pub visibility_enabled: bool,
    pub visible_to: Vec<UserId>,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct MutationCoordinator {
    db: DbHandle,
    blobs: Arc<BlobStore>,
    activity: ActivityLog,
    sessions: SessionStore,
}

impl MutationCoordinator {
    pub fn new(
        db: DbHandle,
        blobs: Arc<BlobStore>,
        activity: ActivityLog,
        sessions: SessionStore,
    ) -> Self {
        Self {
            db,
            blobs,
            activity,
            sessions,
        }
    }

    // ------------------------------------------------------------------
    // Accounts and sessions
    // ------------------------------------------------------------------

    pub async fn register(&self, form: Registration) -> Result<RegisterOutcome, ServerError> {
        let login_name = required(form.login_name, "login_name")?;
        let first_name = required(form.first_name, "first_name")?;
        let last_name = required(form.last_name, "last_name")?;
        let password = required(form.password, "password")?;
        let location = form.location.unwrap_or_default();
        let description = form.description.unwrap_or_default();
        let occupation = form.occupation.unwrap_or_default();

        let outcome = self
            .db
            .call(move |db| {
                let taken = || {
                    ServerError::Conflict(
                        "User already exists with a password. Please log in.".to_string(),
                    )
                };

                match db.find_user_by_login(&login_name)? {
                    Some(existing) if existing.has_credential() => Err(taken()),
                    Some(mut existing) => {
                        let entry = make_password_entry(&password);
                        if !db.set_credential_if_absent(existing.id, &entry)? {
                            return Err(taken());
                        }
                        existing.password_digest = Some(entry.hash);
                        existing.salt = Some(entry.salt);
                        Ok(RegisterOutcome::Claimed(existing))
                    }
                    None => {
                        let mut user = User::new(&login_name, &first_name, &last_name);
                        user.location = location;
                        user.description = description;
                        user.occupation = occupation;
                        let entry = make_password_entry(&password);
                        user.password_digest = Some(entry.hash);
                        user.salt = Some(entry.salt);

                        match db.create_user(&user) {
                            Ok(()) => Ok(RegisterOutcome::Created(user)),
                            Err(StoreError::AlreadyExists(_)) => Err(taken()),
                            Err(e) => Err(e.into()),
                        }
                    }
                }
            })
            .await?;

        match &outcome {
            RegisterOutcome::Created(user) => {
                info!(user = %user.id, login = %user.login_name, "User registered");
                self.activity
                    .log(ActivityKind::UserRegistration, user.id, None, None)
                    .await;
            }
            RegisterOutcome::Claimed(user) => {
                info!(user = %user.id, login = %user.login_name, "Seeded account claimed");
            }
        }
        Ok(outcome)
    }

    pub async fn login(&self, login_name: &str, password: &str) -> Result<LoginSuccess, ServerError> {
        let login_name = login_name.to_string();
        let password = password.to_string();

        let user = self
            .db
            .call(move |db| {
                let user = db
                    .find_user_by_login(&login_name)?
                    .ok_or(ServerError::InvalidCredentials)?;
                let (Some(hash), Some(salt)) = (&user.password_digest, &user.salt) else {
                    return Err(ServerError::InvalidCredentials);
                };
                if !does_password_match(hash, salt, &password) {
                    return Err(ServerError::InvalidCredentials);
                }
                Ok(user)
            })
            .await?;

        let token = self.sessions.create(user.id).await;
        self.activity
            .log(ActivityKind::UserLogin, user.id, None, None)
            .await;
        info!(user = %user.id, "User logged in");

        Ok(LoginSuccess { user, token })
    }

    pub async fn logout(&self, user: UserId, token: &str) {
        self.activity
            .log(ActivityKind::UserLogout, user, None, None)
            .await;
        self.sessions.destroy(token).await;
        info!(user = %user, "User logged out");
    }

    /// Remove an account and everything hanging off it. Only the account
    /// holder may do this.
    pub async fn delete_account(
        &self,
        user: UserId,
        requester: UserId,
    ) -> Result<AccountDeletion, ServerError> {
        if user != requester {
            return Err(ServerError::NotFound(
                "User not found or unauthorized.".to_string(),
            ));
        }

        let report = self.db.call(move |db| Ok(db.delete_account(user)?)).await?;
        if !report.user_deleted {
            return Err(ServerError::NotFound(
                "User not found or unauthorized.".to_string(),
            ));
        }

        for name in &report.deleted_files {
            self.remove_image(name).await;
        }
        let sessions = self.sessions.destroy_user(user).await;
        info!(user = %user, sessions, "Account removed");

        Ok(report)
    }

    // ------------------------------------------------------------------
    // Photos
    // ------------------------------------------------------------------

    pub async fn upload_photo(
        &self,
        owner: UserId,
        upload: UploadRequest,
    ) -> Result<Photo, ServerError> {
        if upload.bytes.is_empty() {
            return Err(ServerError::BadRequest("No file uploaded".to_string()));
        }

        let visibility = Visibility::from_upload(upload.visibility_enabled, upload.visible_to);
        let mut photo = Photo::new(owner, "", visibility);
        let file_name = stored_file_name(
            &upload.original_name,
            Utc::now().timestamp_millis(),
            &photo.id.to_string(),
        );
        self.blobs.write(&file_name, &upload.bytes).await?;
        photo.file_name = file_name.clone();

        let record = photo.clone();
        if let Err(e) = self.db.call(move |db| Ok(db.insert_photo(&record)?)).await {
            self.remove_image(&file_name).await;
            return Err(e);
        }

        info!(photo = %photo.id, owner = %owner, file = %file_name, "Photo uploaded");
        self.activity
            .log(ActivityKind::PhotoUpload, owner, Some(photo.id), None)
            .await;
        Ok(photo)
    }

    /// Delete a photo the requester owns. Mentions of it elsewhere and
    /// favorites pointing at it are left dangling.
    pub async fn delete_photo(&self, photo: PhotoId, requester: UserId) -> Result<(), ServerError> {
        let file_name = self
            .db
            .call(move |db| {
                let found = db
                    .find_photo_owned(photo, requester)?
                    .ok_or_else(|| {
                        ServerError::NotFound("Photo not found or unauthorized.".to_string())
                    })?;
                db.delete_photo(found.id)?;
                Ok(found.file_name)
            })
            .await?;

        self.remove_image(&file_name).await;
        info!(photo = %photo, "Photo deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, photo: PhotoId, user: UserId) -> Result<LikeState, ServerError> {
        self.db
            .call(move |db| {
                let mut found = db
                    .find_photo(photo)?
                    .ok_or_else(|| ServerError::NotFound("Photo not found".to_string()))?;
                let liked_by_user = found.toggle_like(user);
                db.update_photo(&found)?;
                Ok(LikeState {
                    like_count: found.like_count,
                    liked_by: found.liked_by,
                    liked_by_user,
                })
            })
            .await
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn add_comment(
        &self,
        photo: PhotoId,
        text: &str,
        author: UserId,
    ) -> Result<Photo, ServerError> {
        if text.trim().is_empty() {
            return Err(ServerError::BadRequest("Comment cannot be empty.".to_string()));
        }
        let text = text.to_string();
        let detail = text.clone();

        let updated = self
            .db
            .call(move |db| {
                let mut found = db
                    .find_photo(photo)?
                    .ok_or_else(|| ServerError::NotFound("Photo not found.".to_string()))?;
                found.add_comment(author, &text);
                db.update_photo(&found)?;
                Ok(found)
            })
            .await?;

        self.activity
            .log(ActivityKind::NewComment, author, Some(photo), Some(detail))
            .await;
        Ok(updated)
    }

    /// Delete a comment the requester wrote, together with its mention
    /// entries.
    pub async fn delete_comment(
        &self,
        comment: CommentId,
        requester: UserId,
    ) -> Result<(), ServerError> {
        self.db
            .call(move |db| {
                let mut photo = db
                    .find_photo_with_comment(comment, requester)?
                    .ok_or_else(|| {
                        ServerError::NotFound("Comment not found or unauthorized.".to_string())
                    })?;
                photo.remove_comment(comment);
                db.update_photo(&photo)?;
                Ok(())
            })
            .await?;

        info!(comment = %comment, "Comment deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn toggle_favorite(
        &self,
        user: UserId,
        photo: PhotoId,
        change: FavoriteChange,
    ) -> Result<Vec<PhotoId>, ServerError> {
        self.db
            .call(move |db| {
                let mut found = db
                    .find_user(user)?
                    .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;
                let changed = match change {
                    FavoriteChange::Add => found.add_favorite(photo),
                    FavoriteChange::Remove => found.remove_favorite(photo),
                };
                if changed {
                    db.save_favorites(user, &found.favorites)?;
                }
                Ok(found.favorites)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn remove_image(&self, name: &str) {
        if let Err(e) = self.blobs.delete(name).await {
            warn!(file = %name, error = %e, "Failed to remove image");
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServerError::BadRequest(format!("Missing required field: {field}"))),
    }
}
