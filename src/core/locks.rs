use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

use crate::error::{RankError, Result};

// Idle entries are swept once the registry grows past this many users
const SWEEP_THRESHOLD: usize = 1024;

/// Per-user single-writer scopes
///
/// Resolutions for one user queue on the same async mutex; resolutions for
/// different users never touch each other's lock. The guard is released
/// when dropped, on every exit path.
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

pub type UserGuard = OwnedMutexGuard<()>;

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the user's scope, giving up with a conflict after `timeout`
    pub async fn acquire(&self, user_id: &str, timeout: Duration) -> Result<UserGuard> {
        let lock = {
            let mut map = self
                .inner
                .lock()
                .map_err(|_| RankError::StoreUnavailable("user lock registry poisoned".to_string()))?;

            if map.len() > SWEEP_THRESHOLD {
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }

            map.entry(user_id.to_string()).or_default().clone()
        };

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                RankError::ConcurrentUpdateConflict(format!(
                    "could not lock rankings of user {} within {:?}",
                    user_id, timeout
                ))
            })
    }
}
