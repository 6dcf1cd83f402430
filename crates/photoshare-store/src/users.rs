//! CRUD operations for [`User`] records.

use photoshare_shared::crypto::PasswordEntry;
use photoshare_shared::{PhotoId, UserId};
use rusqlite::{params, ErrorCode, OptionalExtension};

use crate::codec::{encode_json, json_column, parsed_column};
use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{User, UserSummary};

const USER_COLUMNS: &str = "id, login_name, first_name, last_name, location, description, \
                            occupation, favorites, password_digest, salt";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user. Fails with [`StoreError::AlreadyExists`] when the
    /// login handle is taken.
    pub fn create_user(&self, user: &User) -> Result<()> {
        let favorites = encode_json(&user.favorites)?;
        self.conn()
            .execute(
                "INSERT INTO users (id, login_name, first_name, last_name, location,
                                    description, occupation, favorites, password_digest, salt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    user.id.to_string(),
                    user.login_name,
                    user.first_name,
                    user.last_name,
                    user.location,
                    user.description,
                    user.occupation,
                    favorites,
                    user.password_digest,
                    user.salt,
                ],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    StoreError::AlreadyExists(user.login_name.clone())
                }
                _ => StoreError::Sqlite(e),
            })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    pub fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .optional()?)
    }

    pub fn find_user_by_login(&self, login_name: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE login_name = ?1"),
                params![login_name],
                row_to_user,
            )
            .optional()?)
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid ASC"))?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn list_user_summaries(&self) -> Result<Vec<UserSummary>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, first_name, last_name FROM users ORDER BY rowid ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(UserSummary {
                id: parsed_column(row, 0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn count_users(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Attach a credential to an account that has none. Returns `false` if
    /// the account is missing or already has a credential; an existing
    /// credential is never overwritten.
    pub fn set_credential_if_absent(&self, id: UserId, entry: &PasswordEntry) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET password_digest = ?1, salt = ?2
             WHERE id = ?3 AND password_digest IS NULL",
            params![entry.hash, entry.salt, id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Overwrite the favorites set. Returns `false` if the user is missing.
    pub fn save_favorites(&self, id: UserId, favorites: &[PhotoId]) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET favorites = ?1 WHERE id = ?2",
            params![encode_json(favorites)?, id.to_string()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a lone user record. Account removal with its cascade goes
    /// through [`Database::delete_account`].
    pub fn delete_user(&self, id: UserId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parsed_column(row, 0)?,
        login_name: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        location: row.get(4)?,
        description: row.get(5)?,
        occupation: row.get(6)?,
        favorites: json_column(row, 7)?,
        password_digest: row.get(8)?,
        salt: row.get(9)?,
    })
}
