use serde::{Deserialize, Serialize};
use crate::models::domain::{Category, RankedReview};

/// Response for the resolve endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    #[serde(rename = "finalPosition")]
    pub final_position: usize,
    pub rating: f64,
}

/// A user's full ordered review list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub reviews: Vec<RankedReview>,
    pub count: usize,
}

/// Positions currently occupied by one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketResponse {
    pub category: Category,
    pub low: i64,
    pub high: i64,
    pub size: usize,
}

/// Next step of a client-side comparison loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextOpponentResponse {
    #[serde(rename = "opponentPlaceId")]
    pub opponent_place_id: Option<String>,
    pub low: i64,
    pub high: i64,
    pub settled: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
