//! Account removal.
//!
//! Deleting an account touches all three collections. Every step runs inside
//! one SQLite transaction, so a failure part-way leaves nothing removed.

use photoshare_shared::UserId;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::photos::{collect_photos, update_photo_row, PHOTO_COLUMNS};

/// What an account deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDeletion {
    pub user_deleted: bool,
    /// Stored file names of the photos that went with the account.
    pub deleted_files: Vec<String>,
    pub comments_removed: usize,
    pub activities_deleted: usize,
}

impl Database {
    /// Remove `user` together with the photos they own, the comments they
    /// wrote on other photos (and the mention entries of those comments) and
    /// their activity history.
    pub fn delete_account(&mut self, user: UserId) -> Result<AccountDeletion> {
        let user_key = user.to_string();
        let tx = self.conn_mut().transaction()?;

        let user_deleted = tx.execute("DELETE FROM users WHERE id = ?1", params![user_key])? > 0;

        let deleted_files = {
            let mut stmt = tx.prepare("SELECT file_name FROM photos WHERE user_id = ?1")?;
            let rows = stmt.query_map(params![user_key], |row| row.get::<_, String>(0))?;
            let mut files = Vec::new();
            for row in rows {
                files.push(row?);
            }
            files
        };
        tx.execute("DELETE FROM photos WHERE user_id = ?1", params![user_key])?;

        let commented = collect_photos(
            &tx,
            &format!(
                "SELECT {PHOTO_COLUMNS} FROM photos
                 WHERE EXISTS (
                     SELECT 1 FROM json_each(photos.comments) AS c
                     WHERE json_extract(c.value, '$.user_id') = ?1
                 )"
            ),
            params![user_key],
        )?;
        let mut comments_removed = 0;
        for mut photo in commented {
            comments_removed += photo.remove_comments_by(user);
            update_photo_row(&tx, &photo)?;
        }

        let activities_deleted =
            tx.execute("DELETE FROM activities WHERE user_id = ?1", params![user_key])?;

        tx.commit()?;

        tracing::info!(
            user = %user,
            user_deleted,
            photos = deleted_files.len(),
            comments_removed,
            activities_deleted,
            "account deleted"
        );

        Ok(AccountDeletion {
            user_deleted,
            deleted_files,
            comments_removed,
            activities_deleted,
        })
    }
}
