//! Append-only storage for [`Activity`] records.

use photoshare_shared::UserId;
use rusqlite::params;

use crate::codec::{encode_ts, opt_parsed_column, parsed_column, ts_column};
use crate::database::Database;
use crate::error::Result;
use crate::models::Activity;

const ACTIVITY_COLUMNS: &str = "id, activity_type, user_id, photo_id, detail, date_time";

impl Database {
    pub fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.conn().execute(
            "INSERT INTO activities (id, activity_type, user_id, photo_id, detail, date_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.id.to_string(),
                activity.kind.as_str(),
                activity.user_id.to_string(),
                activity.photo_id.map(|p| p.to_string()),
                activity.detail,
                encode_ts(&activity.date_time),
            ],
        )?;
        Ok(())
    }

    /// The `limit` newest activities, newest first.
    pub fn list_recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities
             ORDER BY date_time DESC, rowid DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit as i64], row_to_activity)?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Every activity of `user`, newest first.
    pub fn list_activities_for_user(&self, user: UserId) -> Result<Vec<Activity>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities
             WHERE user_id = ?1
             ORDER BY date_time DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![user.to_string()], row_to_activity)?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    pub fn count_activities(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Map a `rusqlite::Row` to an [`Activity`]. Unknown kinds fail the read.
fn row_to_activity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: parsed_column(row, 0)?,
        kind: parsed_column(row, 1)?,
        user_id: parsed_column(row, 2)?,
        photo_id: opt_parsed_column(row, 3)?,
        detail: row.get(4)?,
        date_time: ts_column(row, 5)?,
    })
}
