//! Async access to the synchronous SQLite store.

use std::sync::{Arc, Mutex};

use photoshare_store::Database;

use crate::error::ServerError;

/// Shared handle to the [`Database`]. Each call locks the connection on a
/// blocking thread, so a slow query never stalls the async workers.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<Mutex<Database>>,
}

impl DbHandle {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` with exclusive access to the database.
    pub async fn call<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Database) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut db = inner
                .lock()
                .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))?;
            f(&mut db)
        })
        .await
        .map_err(|e| ServerError::Internal(format!("database task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoshare_shared::UserId;
    use photoshare_store::User;

    #[tokio::test]
    async fn test_call_round_trip() {
        let handle = DbHandle::new(Database::open_in_memory().unwrap());
        let user = User::new("alice", "Alice", "A");

        handle
            .call(move |db| Ok(db.create_user(&user)?))
            .await
            .unwrap();
        let count = handle.call(|db| Ok(db.count_users()?)).await.unwrap();
        assert_eq!(count, 1);

        let err = handle
            .call(|db| Ok(db.get_user(UserId::new())?))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }
}
