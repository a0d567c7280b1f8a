// Service exports
pub mod cache;
pub mod notifier;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, RankingsCache};
pub use notifier::{LogNotifier, NotifyError, ReviewChangedHook, WebhookNotifier};
pub use postgres::{CategoryColumn, PostgresStore};
pub use store::{Directory, MemoryStore, RankingStore};
