//! Read-side views built on top of the visibility filter.
//!
//! Nothing here writes. Each function takes the viewer explicitly and only
//! ever looks at photos that viewer may see.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use photoshare_shared::{CommentId, PhotoId, UserId, Visibility};
use photoshare_store::{Comment, Database, Mention, Photo, UserSummary};
use serde::Serialize;

use crate::error::ServerError;
use crate::services::visibility::{visible_photos, visible_photos_of};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A comment with its author resolved. `user` is `None` when the author's
/// account no longer exists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentView {
    pub id: CommentId,
    pub comment: String,
    pub date_time: DateTime<Utc>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PhotoView {
    pub id: PhotoId,
    pub file_name: String,
    pub date_time: DateTime<Utc>,
    pub user_id: UserId,
    pub comments: Vec<CommentView>,
    pub mentions: Vec<Mention>,
    #[serde(flatten)]
    pub visibility: Visibility,
    pub like_count: u32,
    pub liked_by: Vec<UserId>,
}

impl PhotoView {
    fn build(photo: Photo, authors: &HashMap<UserId, UserSummary>) -> Self {
        let comments = photo
            .comments
            .into_iter()
            .map(|c: Comment| CommentView {
                user: authors.get(&c.user_id).cloned(),
                id: c.id,
                comment: c.comment,
                date_time: c.date_time,
            })
            .collect();

        Self {
            id: photo.id,
            file_name: photo.file_name,
            date_time: photo.date_time,
            user_id: photo.user_id,
            comments,
            mentions: photo.mentions,
            visibility: photo.visibility,
            like_count: photo.like_count,
            liked_by: photo.liked_by,
        }
    }
}

/// Result of the most-recent-photo lookup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecentPhoto {
    Found(PhotoView),
    NoPhotos,
}

/// Result of the most-commented-photo lookup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommentedPhoto {
    Found(PhotoView),
    NoCommentedPhotos,
}

/// A photo that mentions someone, with its owner attached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MentionedPhoto {
    #[serde(flatten)]
    pub photo: PhotoView,
    pub owner: Option<UserSummary>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Visible photos of `owner` in upload order, comments enriched.
pub fn photos_of_user(
    db: &Database,
    viewer: UserId,
    owner: UserId,
) -> Result<Vec<PhotoView>, ServerError> {
    require_user(db, owner)?;
    let authors = author_index(db)?;
    Ok(visible_photos_of(db, viewer, owner)?
        .into_iter()
        .map(|p| PhotoView::build(p, &authors))
        .collect())
}

/// One visible photo of `owner`.
pub fn photo_of_user(
    db: &Database,
    viewer: UserId,
    owner: UserId,
    photo: PhotoId,
) -> Result<PhotoView, ServerError> {
    let found = db
        .find_photo_owned(photo, owner)?
        .filter(|p| p.is_visible_to(viewer))
        .ok_or_else(|| ServerError::NotFound("Photo not found".to_string()))?;
    Ok(PhotoView::build(found, &author_index(db)?))
}

/// The visible photo of `owner` with the latest upload time.
pub fn most_recent_photo(
    db: &Database,
    viewer: UserId,
    owner: UserId,
) -> Result<RecentPhoto, ServerError> {
    let newest = visible_photos_of(db, viewer, owner)?
        .into_iter()
        .reduce(|best, p| if p.date_time > best.date_time { p } else { best });

    match newest {
        Some(photo) => Ok(RecentPhoto::Found(PhotoView::build(photo, &author_index(db)?))),
        None => Ok(RecentPhoto::NoPhotos),
    }
}

/// The visible photo of `owner` with the most comments. On a tie the earlier
/// upload wins.
pub fn most_commented_photo(
    db: &Database,
    viewer: UserId,
    owner: UserId,
) -> Result<CommentedPhoto, ServerError> {
    let busiest = visible_photos_of(db, viewer, owner)?
        .into_iter()
        .filter(|p| p.comment_count() > 0)
        .reduce(|best, p| {
            let more = p.comment_count() > best.comment_count();
            let tie_but_earlier =
                p.comment_count() == best.comment_count() && p.date_time < best.date_time;
            if more || tie_but_earlier {
                p
            } else {
                best
            }
        });

    match busiest {
        Some(photo) => Ok(CommentedPhoto::Found(PhotoView::build(
            photo,
            &author_index(db)?,
        ))),
        None => Ok(CommentedPhoto::NoCommentedPhotos),
    }
}

/// Visible photos whose mention index names `target`.
pub fn mentions_of_user(
    db: &Database,
    viewer: UserId,
    target: UserId,
) -> Result<Vec<MentionedPhoto>, ServerError> {
    let authors = author_index(db)?;
    Ok(visible_photos(db, viewer)?
        .into_iter()
        .filter(|p| p.mentions_user(target))
        .map(|p| {
            let owner = authors.get(&p.user_id).cloned();
            MentionedPhoto {
                photo: PhotoView::build(p, &authors),
                owner,
            }
        })
        .collect())
}

/// The viewer's favorites that still exist and are still visible to them,
/// in the order they were added.
pub fn favorite_photos(db: &Database, viewer: UserId) -> Result<Vec<PhotoView>, ServerError> {
    let user = db.get_user(viewer)?;
    let authors = author_index(db)?;

    let mut photos = Vec::with_capacity(user.favorites.len());
    for id in user.favorites {
        if let Some(photo) = db.find_photo(id)?.filter(|p| p.is_visible_to(viewer)) {
            photos.push(PhotoView::build(photo, &authors));
        }
    }
    Ok(photos)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_user(db: &Database, id: UserId) -> Result<(), ServerError> {
    match db.find_user(id)? {
        Some(_) => Ok(()),
        None => Err(ServerError::BadRequest("User not found".to_string())),
    }
}

fn author_index(db: &Database) -> Result<HashMap<UserId, UserSummary>, ServerError> {
    Ok(db
        .list_user_summaries()?
        .into_iter()
        .map(|s| (s.id, s))
        .collect())
}
