// Core algorithm exports
pub mod buckets;
pub mod locks;
pub mod rating;
pub mod replay;
pub mod resolver;

pub use buckets::{bucket_of, frame_without};
pub use locks::{UserGuard, UserLocks};
pub use rating::{derive_rating, rate_all};
pub use replay::{replay, Replay, ReplayOutcome};
pub use resolver::{MatchResolver, NextStep, Resolution, ResolverSettings, Submission};
