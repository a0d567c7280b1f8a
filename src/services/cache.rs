use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use thiserror::Error;

use crate::models::RankedReview;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt cache entry: {0}")]
    Encoding(#[from] serde_json::Error),
}

fn generation_key(user_id: &str) -> String {
    format!("placerank:rankings-gen:{}", user_id)
}

fn rankings_key(user_id: &str, generation: u64) -> String {
    format!("placerank:rankings:{}:{}", user_id, generation)
}

/// Read-through cache of each user's rated ranking
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Entries are keyed by a per-user generation counter kept in Redis.
/// Resolve bumps the counter after the store commit, so a reader that
/// loaded the store before the commit writes under a generation nobody
/// reads any more.
pub struct RankingsCache {
    redis: ConnectionManager,
    local: moka::future::Cache<String, Vec<RankedReview>>,
    ttl_secs: u64,
}

impl RankingsCache {
    pub async fn connect(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let local = moka::future::Cache::builder()
            .max_capacity(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self { redis, local, ttl_secs })
    }

    /// Current generation of a user's entry; read it before loading the store
    pub async fn generation(&self, user_id: &str) -> Result<u64, CacheError> {
        let mut conn = self.redis.clone();
        let generation: Option<u64> = conn.get(generation_key(user_id)).await?;
        Ok(generation.unwrap_or(0))
    }

    /// Cached ranking of a user, `None` on a miss in both tiers
    pub async fn rankings(
        &self,
        user_id: &str,
        generation: u64,
    ) -> Result<Option<Vec<RankedReview>>, CacheError> {
        let key = rankings_key(user_id, generation);
        if let Some(reviews) = self.local.get(&key).await {
            return Ok(Some(reviews));
        }

        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(&key).await?;
        let Some(raw) = raw else {
            tracing::trace!("Rankings cache miss for {}", user_id);
            return Ok(None);
        };

        let reviews: Vec<RankedReview> = serde_json::from_str(&raw)?;
        self.local.insert(key, reviews.clone()).await;
        Ok(Some(reviews))
    }

    pub async fn store_rankings(
        &self,
        user_id: &str,
        generation: u64,
        reviews: &[RankedReview],
    ) -> Result<(), CacheError> {
        let key = rankings_key(user_id, generation);
        let raw = serde_json::to_string(reviews)?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, raw, self.ttl_secs).await?;
        self.local.insert(key, reviews.to_vec()).await;
        Ok(())
    }

    /// Retire every entry of the user by moving to the next generation
    pub async fn invalidate(&self, user_id: &str) -> Result<(), CacheError> {
        let mut conn = self.redis.clone();
        let retired: u64 = conn.incr(generation_key(user_id), 1u64).await?;
        self.local.invalidate(&rankings_key(user_id, retired.saturating_sub(1))).await;
        Ok(())
    }
}
