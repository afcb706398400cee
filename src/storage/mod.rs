//! Storage and persistence layer
//!
//! - Durable per-origin key-value store (file-backed or in-memory)
//! - Connection flag cookie
//! - Persisted connection record with lazy expiry

mod cookie;
mod local_store;
mod record;

pub use cookie::{CookieJar, MemoryCookieJar, WALLET_CONNECTED_COOKIE};
pub use local_store::{FileStore, LocalStore, MemoryStore};
pub use record::{PersistedRecord, RecordStore};
