//! v001 -- Initial schema creation.
//!
//! Creates the three collections: `users`, `photos` and `activities`.
//! References between them are weak; cascades are applied explicitly by the
//! store, not by foreign keys.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    login_name      TEXT NOT NULL UNIQUE,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    location        TEXT NOT NULL DEFAULT '',
    description     TEXT NOT NULL DEFAULT '',
    occupation      TEXT NOT NULL DEFAULT '',
    favorites       TEXT NOT NULL DEFAULT '[]',    -- JSON array of photo ids
    password_digest TEXT,                          -- NULL for pre-seeded accounts
    salt            TEXT
);

-- ----------------------------------------------------------------
-- Photos
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS photos (
    id                TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    file_name         TEXT NOT NULL,               -- name in the image store
    date_time         TEXT NOT NULL,               -- RFC-3339, fixed width
    user_id           TEXT NOT NULL,               -- owner
    comments          TEXT NOT NULL DEFAULT '[]',  -- JSON array of comments
    mentions          TEXT NOT NULL DEFAULT '[]',  -- JSON array of {comment_id, user_id}
    visibility        TEXT NOT NULL DEFAULT '[]',  -- JSON array of user ids
    visibility_toggle INTEGER,                     -- NULL for legacy (public) documents
    like_count        INTEGER NOT NULL DEFAULT 0,
    liked_by          TEXT NOT NULL DEFAULT '[]'   -- JSON array of user ids
);

CREATE INDEX IF NOT EXISTS idx_photos_user_id ON photos(user_id);

-- ----------------------------------------------------------------
-- Activities
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS activities (
    id            TEXT PRIMARY KEY NOT NULL,       -- UUID v4
    activity_type TEXT NOT NULL CHECK (activity_type IN (
        'Photo Upload', 'New Comment', 'User Registration', 'User Login', 'User Logout'
    )),
    user_id       TEXT NOT NULL,
    photo_id      TEXT,
    detail        TEXT,
    date_time     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activities_ts ON activities(date_time DESC);
CREATE INDEX IF NOT EXISTS idx_activities_user_ts
    ON activities(user_id, date_time DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
