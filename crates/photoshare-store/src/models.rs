//! Domain model structs persisted in the database.
//!
//! Every struct derives `Serialize` and `Deserialize`; credentials are never
//! serialized. Mutations that must keep a record internally consistent (likes,
//! comments and their mention entries, favorites) live here as methods so the
//! invariants hold no matter which caller edits the document.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use photoshare_shared::mention;
use photoshare_shared::{ActivityId, ActivityKind, CommentId, PhotoId, UserId, Visibility};

/// Current time at the precision the store persists.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account. `password_digest` and `salt` are absent for pre-seeded
/// accounts until their owner claims them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub occupation: String,
    /// Favorited photos, without duplicates, in the order they were added.
    #[serde(default)]
    pub favorites: Vec<PhotoId>,
    #[serde(skip)]
    pub password_digest: Option<String>,
    #[serde(skip)]
    pub salt: Option<String>,
}

impl User {
    pub fn new(login_name: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: UserId::new(),
            login_name: login_name.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            location: String::new(),
            description: String::new(),
            occupation: String::new(),
            favorites: Vec::new(),
            password_digest: None,
            salt: None,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.password_digest.is_some()
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Returns `false` if the photo was already a favorite.
    pub fn add_favorite(&mut self, photo: PhotoId) -> bool {
        if self.favorites.contains(&photo) {
            return false;
        }
        self.favorites.push(photo);
        true
    }

    /// Returns `false` if the photo was not a favorite.
    pub fn remove_favorite(&mut self, photo: PhotoId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|p| *p != photo);
        self.favorites.len() != before
    }
}

/// Display fields attached to comments, mentions and user lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// A comment embedded in its photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub comment: String,
    pub date_time: DateTime<Utc>,
    pub user_id: UserId,
}

/// Mention index entry: `comment_id` names `user_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mention {
    pub comment_id: CommentId,
    pub user_id: UserId,
}

/// An uploaded photo and everything embedded in it.
///
/// Invariants:
/// - `like_count == liked_by.len()`
/// - every `mentions` entry names a comment present in `comments`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Photo {
    pub id: PhotoId,
    pub file_name: String,
    pub date_time: DateTime<Utc>,
    pub user_id: UserId,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(flatten)]
    pub visibility: Visibility,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by: Vec<UserId>,
}

impl Photo {
    pub fn new(owner: UserId, file_name: &str, visibility: Visibility) -> Self {
        Self {
            id: PhotoId::new(),
            file_name: file_name.to_string(),
            date_time: timestamp_now(),
            user_id: owner,
            comments: Vec::new(),
            mentions: Vec::new(),
            visibility,
            like_count: 0,
            liked_by: Vec::new(),
        }
    }

    pub fn is_visible_to(&self, viewer: UserId) -> bool {
        self.visibility.permits(self.user_id, viewer)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Append a comment and one mention entry per `@[Name](id)` markup in it.
    pub fn add_comment(&mut self, author: UserId, text: &str) -> CommentId {
        let comment = Comment {
            id: CommentId::new(),
            comment: text.to_string(),
            date_time: timestamp_now(),
            user_id: author,
        };

        for parsed in mention::parse_mentions(text) {
            self.mentions.push(Mention {
                comment_id: comment.id,
                user_id: parsed.user_id,
            });
        }

        let id = comment.id;
        self.comments.push(comment);
        id
    }

    /// The comment `id`, if `author` wrote it.
    pub fn find_comment_by(&self, id: CommentId, author: UserId) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|c| c.id == id && c.user_id == author)
    }

    /// Remove a comment together with the mention entries tied to it.
    pub fn remove_comment(&mut self, id: CommentId) -> Option<Comment> {
        let index = self.comments.iter().position(|c| c.id == id)?;
        let removed = self.comments.remove(index);
        self.mentions.retain(|m| m.comment_id != id);
        Some(removed)
    }

    /// Remove every comment written by `author`. Returns how many went.
    pub fn remove_comments_by(&mut self, author: UserId) -> usize {
        let gone: Vec<CommentId> = self
            .comments
            .iter()
            .filter(|c| c.user_id == author)
            .map(|c| c.id)
            .collect();

        for id in &gone {
            self.remove_comment(*id);
        }
        gone.len()
    }

    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.iter().any(|m| m.user_id == user)
    }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.liked_by.contains(&user)
    }

    /// Like if not yet liked by `user`, unlike otherwise. Returns whether the
    /// user likes the photo afterwards.
    pub fn toggle_like(&mut self, user: UserId) -> bool {
        let liked = if self.is_liked_by(user) {
            self.liked_by.retain(|u| *u != user);
            false
        } else {
            self.liked_by.push(user);
            true
        };
        self.like_count = self.liked_by.len() as u32;
        liked
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// An immutable platform event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "activity_type")]
    pub kind: ActivityKind,
    pub user_id: UserId,
    pub photo_id: Option<PhotoId>,
    pub detail: Option<String>,
    pub date_time: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        kind: ActivityKind,
        user_id: UserId,
        photo_id: Option<PhotoId>,
        detail: Option<String>,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            kind,
            user_id,
            photo_id,
            detail,
            date_time: timestamp_now(),
        }
    }
}
