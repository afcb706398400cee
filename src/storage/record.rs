use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::local_store::LocalStore;
use crate::address::Address;
use crate::error::StorageError;

// Fixed storage keys, one scalar entry each.
const KEY_ADDRESS: &str = "wallet-address";
const KEY_CONNECTED: &str = "wallet-connected";
const KEY_TIMESTAMP: &str = "wallet-connected-at";

/// Durable snapshot of the last successful connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub address: Address,
    pub connected: bool,
    pub timestamp: DateTime<Utc>,
}

impl PersistedRecord {
    pub fn new(address: Address, timestamp: DateTime<Utc>) -> Self {
        Self {
            address,
            connected: true,
            timestamp,
        }
    }

    /// A record counts only while it marks a connection younger than the
    /// TTL. Expired records are treated as absent (lazy expiry, the store
    /// is not swept).
    pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.connected && now - self.timestamp < ttl
    }
}

/// Reads and writes the persisted record over a `LocalStore`.
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn LocalStore>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, record: &PersistedRecord) -> Result<(), StorageError> {
        self.store
            .set_item(KEY_ADDRESS, &record.address.to_string())?;
        self.store
            .set_item(KEY_CONNECTED, if record.connected { "true" } else { "false" })?;
        self.store
            .set_item(KEY_TIMESTAMP, &record.timestamp.timestamp_millis().to_string())?;
        Ok(())
    }

    /// Load the record, or `None` if any of the three entries is missing or
    /// unparseable. A corrupt record reads as absent rather than failing
    /// hydration.
    pub fn load(&self) -> Result<Option<PersistedRecord>, StorageError> {
        let address = match self.store.get_item(KEY_ADDRESS)? {
            Some(raw) => match Address::from_str(&raw) {
                Ok(addr) => addr,
                Err(e) => {
                    log::warn!("Discarding persisted record with bad address: {}", e);
                    return Ok(None);
                }
            },
            None => return Ok(None),
        };

        let connected = match self.store.get_item(KEY_CONNECTED)? {
            Some(raw) => raw == "true",
            None => return Ok(None),
        };

        let timestamp = match self
            .store
            .get_item(KEY_TIMESTAMP)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        {
            Some(ts) => ts,
            None => {
                log::warn!("Discarding persisted record with bad timestamp");
                return Ok(None);
            }
        };

        Ok(Some(PersistedRecord {
            address,
            connected,
            timestamp,
        }))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_item(KEY_ADDRESS)?;
        self.store.remove_item(KEY_CONNECTED)?;
        self.store.remove_item(KEY_TIMESTAMP)?;
        Ok(())
    }
}
