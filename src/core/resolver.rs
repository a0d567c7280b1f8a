use std::sync::Arc;
use std::time::Duration;

use crate::core::buckets::{bucket_of, frame_without};
use crate::core::locks::{UserGuard, UserLocks};
use crate::core::rating::derive_rating;
use crate::core::replay::{replay, Replay};
use crate::error::{RankError, Result};
use crate::models::{Bucket, Category, Comparison, Review, ReviewUpdate};
use crate::services::{Directory, RankingStore, ReviewChangedHook};

/// One review session's submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub user_id: String,
    pub place_id: String,
    pub category: Category,
    pub comparisons: Vec<Comparison>,
    pub note: Option<String>,
}

/// Committed outcome of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub final_position: usize,
    pub rating: f64,
    pub rereview: bool,
}

/// Where a client's comparison loop currently stands
#[derive(Debug, Clone, PartialEq)]
pub struct NextStep {
    pub opponent: Option<Review>,
    pub low: i64,
    pub high: i64,
}

/// Tunables for the resolver
#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub lock_timeout: Duration,
    pub conflict_retries: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
            conflict_retries: 1,
        }
    }
}

/// Turns a submission into a single ranking-store commit
///
/// # Steps
/// 1. Existence checks for the user and the place
/// 2. Per-user lock, held through validation and commit
/// 3. Replay of the comparisons over the category's bucket
/// 4. `insert_at` for a new review, `move_to` for a re-review
/// 5. Fire-and-forget `review_changed` notification
pub struct MatchResolver {
    store: Arc<dyn RankingStore>,
    directory: Arc<dyn Directory>,
    hook: Arc<dyn ReviewChangedHook>,
    locks: UserLocks,
    settings: ResolverSettings,
}

impl MatchResolver {
    pub fn new(
        store: Arc<dyn RankingStore>,
        directory: Arc<dyn Directory>,
        hook: Arc<dyn ReviewChangedHook>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            store,
            directory,
            hook,
            locks: UserLocks::new(),
            settings,
        }
    }

    /// Hold a user's scope directly; the resolver waits on it like any other writer
    pub async fn lock_user(&self, user_id: &str) -> Result<UserGuard> {
        self.locks.acquire(user_id, self.settings.lock_timeout).await
    }

    /// Resolve a submission, retrying conflicts up to the configured count
    pub async fn resolve(&self, submission: &Submission) -> Result<Resolution> {
        let mut attempt = 0;
        loop {
            match self.resolve_once(submission).await {
                Err(e) if e.is_retryable() && attempt < self.settings.conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Conflict resolving {} for user {} (attempt {}): {}",
                        submission.place_id,
                        submission.user_id,
                        attempt,
                        e
                    );
                }
                result => return result,
            }
        }
    }

    async fn resolve_once(&self, submission: &Submission) -> Result<Resolution> {
        let user_id = submission.user_id.as_str();
        let place_id = submission.place_id.as_str();

        self.require_user(user_id).await?;
        if !self.directory.place_exists(place_id).await? {
            return Err(RankError::NotFound(format!("place {}", place_id)));
        }

        let guard = self.locks.acquire(user_id, self.settings.lock_timeout).await?;

        let ordered = self.store.get_ordered_reviews(user_id).await?;
        let (frame, existing) = frame_without(&ordered, place_id);
        let bucket = bucket_of(&frame, submission.category);

        let outcome = replay(&frame, place_id, bucket, &submission.comparisons)?;
        let position = outcome.final_position;

        tracing::debug!(
            "Replayed {} comparisons for {} in bucket [{}, {}]: position {} ({} ties)",
            submission.comparisons.len(),
            place_id,
            bucket.low,
            bucket.high,
            position,
            outcome.ties
        );

        let rereview = existing.is_some();
        if rereview {
            let update = ReviewUpdate {
                category: submission.category,
                comment: submission.note.clone(),
            };
            self.store.move_to(user_id, place_id, position, update, &ordered).await?;
        } else {
            let review = Review::new(user_id, place_id, submission.category, submission.note.clone());
            self.store.insert_at(user_id, review, position, &ordered).await?;
        }

        drop(guard);

        tracing::info!(
            "Ranked {} for user {} at position {} ({})",
            place_id,
            user_id,
            position,
            if rereview { "re-review" } else { "new review" }
        );

        self.notify(place_id);

        Ok(Resolution {
            final_position: position,
            rating: derive_rating(position, bucket.grown(), submission.category),
            rereview,
        })
    }

    /// Report which opponent the client should compare against next
    pub async fn next_step(
        &self,
        user_id: &str,
        place_id: &str,
        category: Category,
        history: &[Comparison],
    ) -> Result<NextStep> {
        let ordered = self.store.get_ordered_reviews(user_id).await?;
        let (frame, _) = frame_without(&ordered, place_id);
        let bucket = bucket_of(&frame, category);

        let mut state = Replay::new(&frame, place_id, bucket);
        for comparison in history {
            state.apply(comparison)?;
        }

        let (low, high) = state.interval();
        Ok(NextStep {
            opponent: state.next_opponent().cloned(),
            low,
            high,
        })
    }

    pub async fn bucket_of(&self, user_id: &str, category: Category) -> Result<Bucket> {
        self.store.bucket_of(user_id, category).await
    }

    async fn require_user(&self, user_id: &str) -> Result<()> {
        if self.directory.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(RankError::NotFound(format!("user {}", user_id)))
        }
    }

    fn notify(&self, place_id: &str) {
        let hook = Arc::clone(&self.hook);
        let place_id = place_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = hook.review_changed(&place_id).await {
                tracing::warn!("Aggregate notification for place {} failed: {}", place_id, e);
            }
        });
    }
}
