//! CRUD operations for [`Photo`] documents.
//!
//! Owner, file name, upload time and visibility are written once at insert.
//! Later writes replace only the mutable parts of the document: comments,
//! mention index and likes.

use photoshare_shared::{CommentId, PhotoId, UserId, Visibility};
use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{encode_json, encode_ts, json_column, parsed_column, ts_column};
use crate::database::Database;
use crate::error::{not_found, Result};
use crate::models::Photo;

pub(crate) const PHOTO_COLUMNS: &str = "id, file_name, date_time, user_id, comments, mentions, \
                                        visibility, visibility_toggle, like_count, liked_by";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn insert_photo(&self, photo: &Photo) -> Result<()> {
        self.conn().execute(
            "INSERT INTO photos (id, file_name, date_time, user_id, comments, mentions,
                                 visibility, visibility_toggle, like_count, liked_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                photo.id.to_string(),
                photo.file_name,
                encode_ts(&photo.date_time),
                photo.user_id.to_string(),
                encode_json(&photo.comments)?,
                encode_json(&photo.mentions)?,
                encode_json(&photo.visibility.allow_list)?,
                photo.visibility.toggle,
                photo.like_count,
                encode_json(&photo.liked_by)?,
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_photo(&self, id: PhotoId) -> Result<Photo> {
        self.conn()
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
                params![id.to_string()],
                row_to_photo,
            )
            .map_err(not_found)
    }

    pub fn find_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
                params![id.to_string()],
                row_to_photo,
            )
            .optional()?)
    }

    /// The photo `id`, only if `owner` uploaded it.
    pub fn find_photo_owned(&self, id: PhotoId, owner: UserId) -> Result<Option<Photo>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), owner.to_string()],
                row_to_photo,
            )
            .optional()?)
    }

    /// The photo holding comment `comment_id`, only if `author` wrote that
    /// comment.
    pub fn find_photo_with_comment(
        &self,
        comment_id: CommentId,
        author: UserId,
    ) -> Result<Option<Photo>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {PHOTO_COLUMNS} FROM photos
                     WHERE EXISTS (
                         SELECT 1 FROM json_each(photos.comments) AS c
                         WHERE json_extract(c.value, '$.id') = ?1
                           AND json_extract(c.value, '$.user_id') = ?2
                     )"
                ),
                params![comment_id.to_string(), author.to_string()],
                row_to_photo,
            )
            .optional()?)
    }

    /// Every photo in storage (insertion) order.
    pub fn list_photos(&self) -> Result<Vec<Photo>> {
        collect_photos(
            self.conn(),
            &format!("SELECT {PHOTO_COLUMNS} FROM photos ORDER BY rowid ASC"),
            params![],
        )
    }

    /// Photos uploaded by `owner`, in storage order.
    pub fn list_photos_by_owner(&self, owner: UserId) -> Result<Vec<Photo>> {
        collect_photos(
            self.conn(),
            &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE user_id = ?1 ORDER BY rowid ASC"),
            params![owner.to_string()],
        )
    }

    pub fn count_photos(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist the mutable parts of a photo document. Returns `false` if the
    /// photo no longer exists.
    pub fn update_photo(&self, photo: &Photo) -> Result<bool> {
        update_photo_row(self.conn(), photo)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM photos WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn update_photo_row(conn: &Connection, photo: &Photo) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE photos
         SET comments = ?1, mentions = ?2, like_count = ?3, liked_by = ?4
         WHERE id = ?5",
        params![
            encode_json(&photo.comments)?,
            encode_json(&photo.mentions)?,
            photo.like_count,
            encode_json(&photo.liked_by)?,
            photo.id.to_string(),
        ],
    )?;
    Ok(affected > 0)
}

pub(crate) fn collect_photos(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Photo>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_photo)?;

    let mut photos = Vec::new();
    for row in rows {
        photos.push(row?);
    }
    Ok(photos)
}

/// Map a `rusqlite::Row` to a [`Photo`].
pub(crate) fn row_to_photo(row: &rusqlite::Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: parsed_column(row, 0)?,
        file_name: row.get(1)?,
        date_time: ts_column(row, 2)?,
        user_id: parsed_column(row, 3)?,
        comments: json_column(row, 4)?,
        mentions: json_column(row, 5)?,
        visibility: Visibility {
            allow_list: json_column(row, 6)?,
            toggle: row.get(7)?,
        },
        like_count: row.get(8)?,
        liked_by: json_column(row, 9)?,
    })
}
