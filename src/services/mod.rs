// Service exports
pub mod cache;
pub mod chat;
pub mod dating;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use chat::ChatService;
pub use dating::{DatingService, FeedResult};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{ChatStore, ProfileStore, StoreError};
