//! Placerank - pairwise ranking service for place reviews
//!
//! A user files each visited place into a coarse bucket (liked, neutral,
//! disliked) and then answers a short series of "which did you prefer?"
//! questions. This library replays those answers as a binary insertion and
//! commits the resulting position into the user's total order.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchResolver, Resolution, ResolverSettings, Submission};
pub use error::{RankError, Result};
pub use models::{Bucket, Category, Comparison, Outcome, Review, ResolveRequest, ResolveResponse};
