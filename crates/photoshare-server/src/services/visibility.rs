//! Visibility filter: which photos a viewer may see.
//!
//! Recomputed on every read. The predicate itself lives on
//! [`photoshare_shared::Visibility::permits`].

use photoshare_shared::UserId;
use photoshare_store::{Database, Photo, Result};

/// Keep only the photos `viewer` may see, preserving order.
pub fn filter_visible(photos: Vec<Photo>, viewer: UserId) -> Vec<Photo> {
    photos
        .into_iter()
        .filter(|p| p.is_visible_to(viewer))
        .collect()
}

/// Every photo visible to `viewer`, in storage order.
pub fn visible_photos(db: &Database, viewer: UserId) -> Result<Vec<Photo>> {
    Ok(filter_visible(db.list_photos()?, viewer))
}

/// Photos of `owner` visible to `viewer`, in storage order.
pub fn visible_photos_of(db: &Database, viewer: UserId, owner: UserId) -> Result<Vec<Photo>> {
    Ok(filter_visible(db.list_photos_by_owner(owner)?, viewer))
}
