// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Bucket, Category, Comparison, Outcome, RankedReview, Review, ReviewUpdate};
pub use requests::{ComparisonInput, NextOpponentQuery, ResolveRequest};
pub use responses::{BucketResponse, ErrorResponse, HealthResponse, NextOpponentResponse, RankingsResponse, ResolveResponse};
