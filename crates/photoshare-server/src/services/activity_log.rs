//! Activity log: append platform events, read them back enriched for
//! display, and push every new one to live subscribers.

use photoshare_shared::constants::UNKNOWN_USER_NAME;
use photoshare_shared::{ActivityKind, PhotoId, UserId};
use photoshare_store::{Activity, Database};
use serde::Serialize;
use tracing::{debug, warn};

use crate::broadcast::ActivityBroadcaster;
use crate::database::DbHandle;
use crate::error::ServerError;

/// An activity as clients see it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityEvent {
    #[serde(flatten)]
    pub activity: Activity,
    /// First name of the actor, or `"Unknown"` once the account is gone.
    pub user_name: String,
    /// Stored file name of the photo for upload and comment entries; `None`
    /// for other kinds or when the photo has been deleted.
    pub photo_file_name: Option<String>,
}

#[derive(Clone)]
pub struct ActivityLog {
    db: DbHandle,
    broadcaster: ActivityBroadcaster,
}

impl ActivityLog {
    pub fn new(db: DbHandle, broadcaster: ActivityBroadcaster) -> Self {
        Self { db, broadcaster }
    }

    pub fn broadcaster(&self) -> &ActivityBroadcaster {
        &self.broadcaster
    }

    /// Persist a new activity stamped with the current time, then broadcast
    /// it.
    pub async fn record(
        &self,
        kind: ActivityKind,
        actor: UserId,
        photo: Option<PhotoId>,
        detail: Option<String>,
    ) -> Result<ActivityEvent, ServerError> {
        let activity = Activity::new(kind, actor, photo, detail);
        let event = self
            .db
            .call(move |db| {
                db.insert_activity(&activity)?;
                enrich(db, activity)
            })
            .await?;

        let receivers = self.broadcaster.publish(event.clone());
        debug!(kind = %kind, user = %actor, receivers, "Activity recorded");
        Ok(event)
    }

    /// [`record`](Self::record) for callers whose own outcome must not
    /// depend on the log. Failures are reported and swallowed.
    pub async fn log(
        &self,
        kind: ActivityKind,
        actor: UserId,
        photo: Option<PhotoId>,
        detail: Option<String>,
    ) {
        if let Err(e) = self.record(kind, actor, photo, detail).await {
            warn!(kind = %kind, user = %actor, error = %e, "Failed to log activity");
        }
    }

    /// The `limit` newest activities, newest first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, ServerError> {
        self.db
            .call(move |db| {
                db.list_recent_activities(limit)?
                    .into_iter()
                    .map(|a| enrich(db, a))
                    .collect()
            })
            .await
    }

    /// Every activity of `user`, newest first.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<ActivityEvent>, ServerError> {
        self.db
            .call(move |db| {
                db.list_activities_for_user(user)?
                    .into_iter()
                    .map(|a| enrich(db, a))
                    .collect()
            })
            .await
    }
}

fn enrich(db: &Database, activity: Activity) -> Result<ActivityEvent, ServerError> {
    let user_name = db
        .find_user(activity.user_id)?
        .map(|u| u.first_name)
        .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string());

    let photo_file_name = match activity.photo_id {
        Some(photo) if activity.kind.concerns_photo() => {
            db.find_photo(photo)?.map(|p| p.file_name)
        }
        _ => None,
    };

    Ok(ActivityEvent {
        activity,
        user_name,
        photo_file_name,
    })
}
