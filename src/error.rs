use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connect already in progress")]
    ConnectInProgress,

    #[error("Wallet provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures originating from the browser-injected wallet adapter.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No wallet extension available")]
    Unavailable,

    #[error("Connection request rejected by user")]
    Rejected,

    #[error("Operation not supported by this wallet: {0}")]
    Unsupported(String),

    #[error("Wallet RPC error: {0}")]
    Rpc(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cookie error: {0}")]
    Cookie(String),
}
