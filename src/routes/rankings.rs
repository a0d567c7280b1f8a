use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{rate_all, MatchResolver, Submission};
use crate::error::RankError;
use crate::models::{
    BucketResponse, Category, HealthResponse, NextOpponentQuery, NextOpponentResponse,
    RankingsResponse, ResolveRequest, ResolveResponse,
};
use crate::services::{RankingStore, RankingsCache};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RankingStore>,
    pub resolver: Arc<MatchResolver>,
    pub cache: Option<Arc<RankingsCache>>,
    pub max_comparisons: usize,
}

/// Configure all ranking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/reviews/resolve", web::post().to(resolve))
        .route("/users/{user_id}/rankings", web::get().to(get_rankings))
        .route("/users/{user_id}/buckets/{category}", web::get().to(get_bucket))
        .route("/users/{user_id}/next-opponent", web::get().to(next_opponent));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Resolve endpoint
///
/// POST /api/v1/reviews/resolve
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "placeId": "string",
///   "category": "liked|neutral|disliked",
///   "comparisons": [{ "opponentPlaceId": "string", "outcome": "win|loss|tie" }],
///   "note": "string"
/// }
/// ```
async fn resolve(
    state: web::Data<AppState>,
    req: web::Json<ResolveRequest>,
) -> Result<HttpResponse, RankError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for resolve request: {}", errors);
        return Err(errors.into());
    }

    if req.comparisons.len() > state.max_comparisons {
        return Err(RankError::Validation(format!(
            "at most {} comparisons are accepted, got {}",
            state.max_comparisons,
            req.comparisons.len()
        )));
    }

    let submission = Submission {
        user_id: req.user_id.clone(),
        place_id: req.place_id.clone(),
        category: req.category,
        comparisons: req.to_comparisons(),
        note: req.note.clone(),
    };

    let resolution = state.resolver.resolve(&submission).await.map_err(|e| {
        tracing::info!(
            "Resolve rejected for {} / {}: {}",
            submission.user_id,
            submission.place_id,
            e
        );
        e
    })?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.invalidate(&submission.user_id).await {
            tracing::warn!("Failed to invalidate rankings cache: {}", e);
        }
    }

    Ok(HttpResponse::Ok().json(ResolveResponse {
        final_position: resolution.final_position,
        rating: resolution.rating,
    }))
}

/// Ordered reviews with derived ratings
///
/// GET /api/v1/users/{userId}/rankings
async fn get_rankings(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, RankError> {
    let user_id = path.into_inner();

    // The generation is read before the store so a resolve committing in
    // between retires whatever this request writes back
    let mut generation = None;
    if let Some(cache) = &state.cache {
        match cache.generation(&user_id).await {
            Ok(current) => generation = Some(current),
            Err(e) => tracing::warn!("Rankings cache unavailable for {}: {}", user_id, e),
        }
    }

    if let (Some(cache), Some(current)) = (&state.cache, generation) {
        match cache.rankings(&user_id, current).await {
            Ok(Some(reviews)) => {
                return Ok(HttpResponse::Ok().json(RankingsResponse {
                    count: reviews.len(),
                    user_id,
                    reviews,
                }));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Rankings cache read failed for {}: {}", user_id, e),
        }
    }

    let ordered = state.store.get_ordered_reviews(&user_id).await?;
    let reviews = rate_all(&ordered);

    if let (Some(cache), Some(current)) = (&state.cache, generation) {
        if let Err(e) = cache.store_rankings(&user_id, current, &reviews).await {
            tracing::warn!("Failed to cache rankings for {}: {}", user_id, e);
        }
    }

    Ok(HttpResponse::Ok().json(RankingsResponse {
        count: reviews.len(),
        user_id,
        reviews,
    }))
}

/// Positions a category occupies for a user
///
/// GET /api/v1/users/{userId}/buckets/{category}
async fn get_bucket(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, RankError> {
    let (user_id, category) = path.into_inner();
    let category: Category = category.parse().map_err(RankError::Validation)?;

    let bucket = state.resolver.bucket_of(&user_id, category).await?;

    Ok(HttpResponse::Ok().json(BucketResponse {
        category,
        low: bucket.low,
        high: bucket.high,
        size: bucket.len(),
    }))
}

/// Next opponent for a client-side comparison loop
///
/// GET /api/v1/users/{userId}/next-opponent?placeId=..&category=..&history=p2:win,p3:loss
async fn next_opponent(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<NextOpponentQuery>,
) -> Result<HttpResponse, RankError> {
    let user_id = path.into_inner();
    let history = query.parse_history().map_err(RankError::Validation)?;

    let step = state
        .resolver
        .next_step(&user_id, &query.place_id, query.category, &history)
        .await?;

    Ok(HttpResponse::Ok().json(NextOpponentResponse {
        settled: step.opponent.is_none(),
        opponent_place_id: step.opponent.map(|r| r.place_id),
        low: step.low,
        high: step.high,
    }))
}
