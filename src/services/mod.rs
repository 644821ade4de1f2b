// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod semantic;
pub mod store;

pub use cache::{CacheKey, CacheStats, EntityCache};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use semantic::{SemanticError, SemanticScorer};
pub use store::{Store, StoreError};
