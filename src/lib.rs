//! LendX wallet session lifecycle manager
//!
//! Connects, persists, silently reconnects, verifies, and disconnects a
//! browser wallet session for the LendX lending frontend, and orchestrates
//! balance refreshes for the fixed token set.
//!
//! # Architecture
//!
//! - **SessionManager**: owns the session state machine and is the only
//!   writer of the persistence layer
//! - **WalletProvider**: trait over the browser-injected wallet adapter
//! - **LocalStore / CookieJar**: traits over per-origin durable storage and
//!   the request-time flag cookie
//!
//! # Example
//!
//! ```ignore
//! use lendx_session::{SessionManager, WalletProvider};
//! use std::sync::Arc;
//!
//! async fn boot(provider: Arc<dyn WalletProvider>) -> lendx_session::Result<()> {
//!     let manager = SessionManager::new(provider);
//!     manager.hydrate().await?;
//!     if !manager.is_connected() {
//!         let address = manager.connect().await?;
//!         println!("connected as {}", address);
//!     }
//!     Ok(())
//! }
//! ```

// Public modules
pub mod address;
pub mod amount;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod storage;

// Re-exports for convenience
pub use address::Address;
pub use amount::{Amount, TokenSymbol};
pub use config::SessionConfig;
pub use error::{ProviderError, SessionError, StorageError};
pub use provider::{ProviderEvent, SubscriptionId, WalletProvider};
pub use session::{SessionManager, SessionSnapshot};
pub use storage::{
    CookieJar, FileStore, LocalStore, MemoryCookieJar, MemoryStore, PersistedRecord, RecordStore,
    WALLET_CONNECTED_COOKIE,
};

// Common result type
pub type Result<T> = std::result::Result<T, SessionError>;
