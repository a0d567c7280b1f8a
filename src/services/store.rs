use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::core::buckets::bucket_of;
use crate::error::{RankError, Result};
use crate::models::{Bucket, Category, Review, ReviewUpdate};

/// Existence lookups against the user profile and place catalog
#[async_trait]
pub trait Directory: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> Result<bool>;
    async fn place_exists(&self, place_id: &str) -> Result<bool>;
}

/// Durable per-user ordering of reviews
///
/// Every mutation is a single atomic commit: either all shifted rows and
/// the written row change together, or nothing changes.
///
/// Mutations take `seen`, the ordered list the position was computed from.
/// If the stored ordering no longer matches it when the write is about to
/// happen, the mutation fails with `ConcurrentUpdateConflict`.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Reviews of the user ascending by rank position
    async fn get_ordered_reviews(&self, user_id: &str) -> Result<Vec<Review>>;

    /// Insert at `position`, pushing every review at or after it down one
    async fn insert_at(
        &self,
        user_id: &str,
        review: Review,
        position: usize,
        seen: &[Review],
    ) -> Result<()>;

    /// Take an existing review out of the list and put it back at
    /// `new_position`, counted in the list without it
    async fn move_to(
        &self,
        user_id: &str,
        place_id: &str,
        new_position: usize,
        update: ReviewUpdate,
        seen: &[Review],
    ) -> Result<()>;

    async fn bucket_of(&self, user_id: &str, category: Category) -> Result<Bucket> {
        let ordered = self.get_ordered_reviews(user_id).await?;
        Ok(bucket_of(&ordered, category))
    }

    async fn health_check(&self) -> Result<bool>;
}

/// In-process store used by tests and benchmarks
#[derive(Debug, Default)]
pub struct MemoryStore {
    rankings: RwLock<HashMap<String, Vec<Review>>>,
    places: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store that already knows the given users and places
    pub fn with_catalog<U, P>(users: U, places: P) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            rankings: RwLock::new(users.into_iter().map(|u| (u.into(), Vec::new())).collect()),
            places: RwLock::new(places.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn add_user(&self, user_id: &str) {
        self.rankings.write().await.entry(user_id.to_string()).or_default();
    }

    pub async fn add_place(&self, place_id: &str) {
        self.places.write().await.insert(place_id.to_string());
    }
}

/// Fail with a conflict unless the stored ordering still matches `seen`,
/// place for place and category for category
pub(crate) fn ensure_unchanged<'a, I>(user_id: &str, current: I, seen: &[Review]) -> Result<()>
where
    I: ExactSizeIterator<Item = (&'a str, Category)>,
{
    let unchanged = current.len() == seen.len()
        && current
            .zip(seen)
            .all(|((place_id, category), review)| place_id == review.place_id && category == review.category);

    if unchanged {
        Ok(())
    } else {
        Err(RankError::ConcurrentUpdateConflict(format!(
            "rankings of user {} changed since they were read",
            user_id
        )))
    }
}

fn renumber(reviews: &mut [Review]) {
    for (i, review) in reviews.iter_mut().enumerate() {
        review.rank_position = i;
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn user_exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.rankings.read().await.contains_key(user_id))
    }

    async fn place_exists(&self, place_id: &str) -> Result<bool> {
        Ok(self.places.read().await.contains(place_id))
    }
}

#[async_trait]
impl RankingStore for MemoryStore {
    async fn get_ordered_reviews(&self, user_id: &str) -> Result<Vec<Review>> {
        self.rankings
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| RankError::NotFound(format!("user {}", user_id)))
    }

    async fn insert_at(
        &self,
        user_id: &str,
        mut review: Review,
        position: usize,
        seen: &[Review],
    ) -> Result<()> {
        let mut rankings = self.rankings.write().await;
        let reviews = rankings
            .get_mut(user_id)
            .ok_or_else(|| RankError::NotFound(format!("user {}", user_id)))?;

        ensure_unchanged(user_id, reviews.iter().map(|r| (r.place_id.as_str(), r.category)), seen)?;

        if reviews.iter().any(|r| r.place_id == review.place_id) {
            return Err(RankError::ConcurrentUpdateConflict(format!(
                "user {} already reviewed place {}",
                user_id, review.place_id
            )));
        }
        if position > reviews.len() {
            return Err(RankError::ConcurrentUpdateConflict(format!(
                "position {} is past the end of a list of {}",
                position,
                reviews.len()
            )));
        }

        review.user_id = user_id.to_string();
        reviews.insert(position, review);
        renumber(reviews);
        Ok(())
    }

    async fn move_to(
        &self,
        user_id: &str,
        place_id: &str,
        new_position: usize,
        update: ReviewUpdate,
        seen: &[Review],
    ) -> Result<()> {
        let mut rankings = self.rankings.write().await;
        let reviews = rankings
            .get_mut(user_id)
            .ok_or_else(|| RankError::NotFound(format!("user {}", user_id)))?;

        ensure_unchanged(user_id, reviews.iter().map(|r| (r.place_id.as_str(), r.category)), seen)?;

        let current = reviews
            .iter()
            .position(|r| r.place_id == place_id)
            .ok_or_else(|| RankError::NotFound(format!("review of {} by {}", place_id, user_id)))?;

        // The list without the moved review has len - 1 entries
        if new_position >= reviews.len() {
            return Err(RankError::ConcurrentUpdateConflict(format!(
                "position {} is past the end of a list of {}",
                new_position,
                reviews.len() - 1
            )));
        }

        let mut review = reviews.remove(current);
        review.category = update.category;
        review.comment = update.comment;
        review.updated_at = chrono::Utc::now();
        reviews.insert(new_position, review);
        renumber(reviews);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(places: &[&str]) -> MemoryStore {
        let store = MemoryStore::with_catalog(["u1"], places.iter().copied());
        for (i, place) in places.iter().enumerate() {
            let seen = store.get_ordered_reviews("u1").await.unwrap();
            store
                .insert_at("u1", Review::new("u1", *place, Category::Liked, None), i, &seen)
                .await
                .unwrap();
        }
        store
    }

    fn order(reviews: &[Review]) -> Vec<&str> {
        reviews.iter().map(|r| r.place_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_shifts_later_reviews() {
        let store = seeded(&["p1", "p2", "p3"]).await;
        let seen = store.get_ordered_reviews("u1").await.unwrap();
        store
            .insert_at("u1", Review::new("u1", "p4", Category::Liked, None), 1, &seen)
            .await
            .unwrap();

        let reviews = store.get_ordered_reviews("u1").await.unwrap();
        assert_eq!(order(&reviews), vec!["p1", "p4", "p2", "p3"]);
        let positions: Vec<usize> = reviews.iter().map(|r| r.rank_position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_insert_unknown_user() {
        let store = MemoryStore::new();
        let err = store
            .insert_at("ghost", Review::new("ghost", "p1", Category::Liked, None), 0, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RankError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_move_down_and_up() {
        let store = seeded(&["p1", "p2", "p3", "p4"]).await;
        let update = ReviewUpdate { category: Category::Liked, comment: Some("again".into()) };

        let seen = store.get_ordered_reviews("u1").await.unwrap();
        store.move_to("u1", "p1", 2, update.clone(), &seen).await.unwrap();
        let reviews = store.get_ordered_reviews("u1").await.unwrap();
        assert_eq!(order(&reviews), vec!["p2", "p3", "p1", "p4"]);
        assert_eq!(reviews[2].comment.as_deref(), Some("again"));

        store.move_to("u1", "p4", 0, update, &reviews).await.unwrap();
        let reviews = store.get_ordered_reviews("u1").await.unwrap();
        assert_eq!(order(&reviews), vec!["p4", "p2", "p3", "p1"]);
    }

    #[tokio::test]
    async fn test_move_past_end_leaves_list_untouched() {
        let store = seeded(&["p1", "p2"]).await;
        let update = ReviewUpdate { category: Category::Liked, comment: None };

        let seen = store.get_ordered_reviews("u1").await.unwrap();
        assert!(store.move_to("u1", "p1", 2, update, &seen).await.is_err());
        let reviews = store.get_ordered_reviews("u1").await.unwrap();
        assert_eq!(order(&reviews), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_writes_from_a_stale_read_conflict() {
        let store = seeded(&["p1", "p2"]).await;
        let stale = store.get_ordered_reviews("u1").await.unwrap();

        // Another writer lands first
        store
            .insert_at("u1", Review::new("u1", "p3", Category::Liked, None), 0, &stale)
            .await
            .unwrap();

        let err = store
            .insert_at("u1", Review::new("u1", "p4", Category::Neutral, None), 2, &stale)
            .await
            .unwrap_err();
        assert!(matches!(err, RankError::ConcurrentUpdateConflict(_)));

        let update = ReviewUpdate { category: Category::Disliked, comment: None };
        let err = store.move_to("u1", "p1", 1, update.clone(), &stale).await.unwrap_err();
        assert!(matches!(err, RankError::ConcurrentUpdateConflict(_)));

        let reviews = store.get_ordered_reviews("u1").await.unwrap();
        assert_eq!(order(&reviews), vec!["p3", "p1", "p2"]);

        // A category change alone also invalidates the read
        let seen = reviews.clone();
        store.move_to("u1", "p1", 1, update, &seen).await.unwrap();
        let mut relabelled = seen.clone();
        relabelled[1].category = Category::Liked;
        assert!(ensure_unchanged(
            "u1",
            store.get_ordered_reviews("u1").await.unwrap().iter().map(|r| (r.place_id.as_str(), r.category)),
            &relabelled,
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_default_bucket_of() {
        let store = seeded(&["p1", "p2"]).await;
        assert_eq!(store.bucket_of("u1", Category::Liked).await.unwrap(), Bucket::new(0, 1));
        assert_eq!(store.bucket_of("u1", Category::Neutral).await.unwrap(), Bucket::empty_at(2));
    }
}
