//! Wallet provider adapter contract
//!
//! Abstracts the browser-injected wallet object. The session manager is the
//! only caller; implementations wrap an actual extension bridge in the
//! frontend and a scripted mock in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::{Amount, TokenSymbol};
use crate::error::ProviderError;

/// Change notifications the wallet can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderEvent {
    AccountsChanged,
    ChainChanged,
}

/// Opaque handle for an active event subscription. Owned by the session
/// manager and released exactly once on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Currently authorized account, if any. Never prompts.
    async fn get_active_address(&self) -> Result<Option<Address>, ProviderError>;

    /// Request a connection; may prompt the user. `None` means the wallet
    /// answered with an empty account list.
    async fn request_connection(&self) -> Result<Option<Address>, ProviderError>;

    /// Balance of the connected account for one token.
    async fn query_balance(&self, symbol: TokenSymbol) -> Result<Amount, ProviderError>;

    /// Revoke previously granted permissions. Wallets that don't implement
    /// revocation return `ProviderError::Unsupported`.
    async fn revoke_permissions(&self) -> Result<(), ProviderError>;

    /// Register interest in a change notification.
    fn subscribe(&self, event: ProviderEvent) -> Result<SubscriptionId, ProviderError>;

    /// Release a subscription handle.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ProviderError>;
}
