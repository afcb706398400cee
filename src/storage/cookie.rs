use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StorageError;

/// Name of the flag cookie consumed by server-side route guards.
pub const WALLET_CONNECTED_COOKIE: &str = "wallet-connected";

/// Minimal cookie surface the session manager needs: set a same-site flag
/// cookie with a max-age, and clear it. The real jar lives in the browser;
/// this trait is the seam the frontend bridges through.
pub trait CookieJar: Send + Sync {
    fn set(&self, name: &str, value: &str, max_age_secs: i64) -> Result<(), StorageError>;
    fn clear(&self, name: &str) -> Result<(), StorageError>;
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
}

/// In-memory jar for tests.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, String>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn set(&self, name: &str, value: &str, _max_age_secs: i64) -> Result<(), StorageError> {
        self.cookies
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), StorageError> {
        self.cookies.lock().unwrap().remove(name);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.cookies.lock().unwrap().get(name).cloned())
    }
}
