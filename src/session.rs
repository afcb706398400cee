//! Session lifecycle manager
//!
//! Owns the in-memory wallet session and mediates every read/write of the
//! persistence layer and every call into the wallet provider. The manager
//! is the only writer of the persisted record and the flag cookie.
//!
//! States: Disconnected -> Connecting -> Connected, with Disconnected
//! reachable from anywhere via error or explicit disconnect. Verification
//! on visibility regain is transient and not separately observable.
//!
//! All operations are async and never hold the state lock across an await.
//! Completions that outlive a disconnect (a connect or balance refresh
//! racing a logout) are discarded via an epoch counter bumped on every
//! teardown.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::mem;
use std::sync::{Arc, Mutex};

use crate::address::Address;
use crate::amount::{Amount, TokenSymbol};
use crate::config::SessionConfig;
use crate::error::{ProviderError, SessionError, StorageError};
use crate::provider::{ProviderEvent, SubscriptionId, WalletProvider};
use crate::storage::{
    CookieJar, FileStore, LocalStore, MemoryCookieJar, PersistedRecord, RecordStore,
    WALLET_CONNECTED_COOKIE,
};

/// In-memory session state. Internal; consumers read through accessors or
/// [`SessionSnapshot`].
struct Session {
    connected: bool,
    address: Option<Address>,
    balances: BTreeMap<TokenSymbol, Amount>,
    connecting: bool,
    last_error: Option<String>,
    /// Bumped on every teardown; in-flight operations compare against it
    /// before applying results.
    epoch: u64,
    subscriptions: Vec<SubscriptionId>,
}

impl Session {
    fn zero_balances() -> BTreeMap<TokenSymbol, Amount> {
        TokenSymbol::ALL
            .iter()
            .map(|s| (*s, Amount::zero(*s)))
            .collect()
    }

    fn empty() -> Self {
        Self {
            connected: false,
            address: None,
            balances: Self::zero_balances(),
            connecting: false,
            last_error: None,
            epoch: 0,
            subscriptions: Vec::new(),
        }
    }

    /// Reset to the disconnected state, invalidating in-flight operations.
    fn reset(&mut self) {
        self.connected = false;
        self.address = None;
        self.balances = Self::zero_balances();
        self.connecting = false;
        self.last_error = None;
        self.epoch += 1;
    }
}

/// Read-only view of the session for UI consumers, balances already
/// formatted as decimal strings keyed by ticker.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub is_connected: bool,
    pub user_address: Option<String>,
    pub balance: BTreeMap<String, String>,
    pub is_connecting: bool,
    pub error: Option<String>,
}

pub struct SessionManager {
    provider: Arc<dyn WalletProvider>,
    records: RecordStore,
    cookies: Arc<dyn CookieJar>,
    config: SessionConfig,
    state: Mutex<Session>,
}

impl SessionManager {
    /// Create a manager with env-driven config, a file-backed store, and an
    /// in-memory cookie jar (single-tab demos).
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        let config = SessionConfig::from_env();
        let store: Arc<dyn LocalStore> =
            Arc::new(FileStore::new_with_base_dir(config.storage_dir.clone()));
        Self::new_with_collaborators(provider, store, Arc::new(MemoryCookieJar::new()), config)
    }

    /// Create a manager with explicit collaborators (for testing and for
    /// frontends bridging real browser storage)
    pub fn new_with_collaborators(
        provider: Arc<dyn WalletProvider>,
        store: Arc<dyn LocalStore>,
        cookies: Arc<dyn CookieJar>,
        config: SessionConfig,
    ) -> Self {
        Self {
            provider,
            records: RecordStore::new(store),
            cookies,
            config,
            state: Mutex::new(Session::empty()),
        }
    }

    // ============================================================================
    // Public accessors
    // ============================================================================

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state.lock().unwrap().connecting
    }

    pub fn user_address(&self) -> Option<Address> {
        self.state.lock().unwrap().address
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().last_error.clone()
    }

    pub fn balance(&self, symbol: TokenSymbol) -> Amount {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&symbol)
            .copied()
            .unwrap_or_else(|| Amount::zero(symbol))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.state.lock().unwrap();
        SessionSnapshot {
            is_connected: session.connected,
            user_address: session.address.map(|a| a.to_string()),
            balance: TokenSymbol::ALL
                .iter()
                .map(|s| {
                    let amount = session
                        .balances
                        .get(s)
                        .copied()
                        .unwrap_or_else(|| Amount::zero(*s));
                    (s.ticker().to_string(), amount.to_string())
                })
                .collect(),
            is_connecting: session.connecting,
            error: session.last_error.clone(),
        }
    }

    // ============================================================================
    // Lifecycle operations
    // ============================================================================

    /// Establish a wallet connection, possibly prompting the user.
    ///
    /// Rejected with [`SessionError::ConnectInProgress`] while another
    /// connect is in flight. On any failure the session is fully reset,
    /// `last_error` is set, and the error propagates so the UI can show a
    /// notification. `connecting` is false after this settles either way.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        let (epoch, stale_subs) = {
            let mut session = self.state.lock().unwrap();
            if session.connecting {
                return Err(SessionError::ConnectInProgress);
            }
            // A fresh connect starts from the disconnected state; tear down
            // any live connection first.
            let subs = mem::take(&mut session.subscriptions);
            session.connected = false;
            session.address = None;
            session.connecting = true;
            session.last_error = None;
            session.epoch += 1;
            (session.epoch, subs)
        };
        self.drop_subscriptions(stale_subs);

        log::info!("Requesting wallet connection");
        let address = match self.provider.request_connection().await {
            Ok(Some(address)) => address,
            // An empty account list is a rejection as far as the UI cares.
            Ok(None) => return Err(self.fail_connect(ProviderError::Rejected.into())),
            Err(e) => return Err(self.fail_connect(e.into())),
        };

        let subs = self.subscribe_changes();
        {
            let mut session = self.state.lock().unwrap();
            // A disconnect may have settled while the wallet prompt was
            // open; never resurrect the cleared session or re-write its
            // durable state.
            if !session.connecting || session.epoch != epoch {
                drop(session);
                self.drop_subscriptions(subs);
                log::info!("Discarding connect that settled after session teardown");
                return Err(SessionError::Internal(
                    "Session was closed while the wallet prompt was open".to_string(),
                ));
            }
            session.connecting = false;
            session.connected = true;
            session.address = Some(address);
            session.subscriptions = subs;
        }

        if let Err(e) = self.persist_connection(address, Utc::now()) {
            // The live connection stands; only silent reconnection on the
            // next load is lost.
            log::warn!("Failed to persist connection record: {}", e);
        }

        log::info!("Wallet connected: {}", address);
        self.refresh_balance().await;
        Ok(address)
    }

    /// Tear down the session: best-effort permission revocation, release of
    /// change subscriptions, then unconditional clearing of in-memory state,
    /// the persisted record, and the flag cookie. Idempotent; only a local
    /// storage failure surfaces as an error.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        if let Err(e) = self.provider.revoke_permissions().await {
            log::warn!("Permission revocation failed (ignored): {}", e);
        }

        let subs = {
            let mut session = self.state.lock().unwrap();
            let subs = mem::take(&mut session.subscriptions);
            session.reset();
            subs
        };
        self.drop_subscriptions(subs);
        self.clear_durable()?;

        log::info!("Wallet disconnected");
        Ok(())
    }

    /// Re-query both token balances and replace the map atomically. No-op
    /// when disconnected. Failures keep the previous balances and are only
    /// logged; stale numbers beat a broken UI.
    pub async fn refresh_balance(&self) {
        let (epoch, address) = {
            let session = self.state.lock().unwrap();
            if !session.connected {
                log::debug!("Balance refresh skipped: not connected");
                return;
            }
            (session.epoch, session.address)
        };

        let (native, stable) = futures::join!(
            self.provider.query_balance(TokenSymbol::Native),
            self.provider.query_balance(TokenSymbol::Stable),
        );

        let (native, stable) = match (native, stable) {
            (Ok(n), Ok(s)) => (n, s),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Balance refresh failed, keeping previous balances: {}", e);
                return;
            }
        };

        let mut session = self.state.lock().unwrap();
        // The session may have been torn down or reconnected while the
        // queries were in flight; never resurrect stale data.
        if session.epoch != epoch || !session.connected || session.address != address {
            log::debug!("Discarding stale balance refresh");
            return;
        }
        session.balances.insert(TokenSymbol::Native, native);
        session.balances.insert(TokenSymbol::Stable, stable);
    }

    /// One-shot startup hydration from the persisted record.
    ///
    /// A valid record triggers silent reconnection: the live adapter address
    /// must match the persisted one (case-insensitively) and no prompt is
    /// shown. Anything else leaves the session cleanly logged out.
    pub async fn hydrate(&self) -> Result<(), SessionError> {
        let record = match self.records.load()? {
            Some(record) => record,
            None => {
                self.clear_all("no persisted session");
                return Ok(());
            }
        };

        if !record.is_valid(Utc::now(), self.config.session_ttl) {
            self.clear_all("persisted session expired");
            return Ok(());
        }

        match self.provider.get_active_address().await {
            Ok(Some(live)) if live == record.address => {
                let subs = self.subscribe_changes();
                {
                    let mut session = self.state.lock().unwrap();
                    session.connected = true;
                    session.address = Some(live);
                    session.connecting = false;
                    session.last_error = None;
                    session.subscriptions = subs;
                }
                log::info!("Silently reconnected as {}", live);
                self.refresh_balance().await;
            }
            Ok(_) => {
                self.clear_all("active account no longer matches persisted session");
            }
            Err(e) => {
                log::warn!("Wallet query failed during hydration: {}", e);
                self.clear_all("wallet unavailable");
            }
        }
        Ok(())
    }

    /// Re-check the live identity after the tab regains visibility.
    ///
    /// A changed or missing active address triggers a fresh `connect()`
    /// (re-prompt) rather than silently adopting the new account. A failed
    /// query forces a disconnect and records the error.
    pub async fn verify(&self) -> Result<(), SessionError> {
        let expected = {
            let session = self.state.lock().unwrap();
            if !session.connected {
                return Ok(());
            }
            session.address
        };
        let expected = match expected {
            Some(address) => address,
            None => return Ok(()),
        };

        match self.provider.get_active_address().await {
            Ok(Some(live)) if live == expected => {
                self.refresh_balance().await;
                Ok(())
            }
            Ok(other) => {
                log::info!(
                    "Active account changed ({} -> {:?}), re-prompting",
                    expected,
                    other
                );
                self.clear_all("active account changed");
                self.connect().await.map(|_| ())
            }
            Err(e) => {
                log::warn!("Connection verification failed: {}", e);
                let message = SessionError::from(e).to_string();
                self.disconnect().await?;
                self.state.lock().unwrap().last_error = Some(message);
                Ok(())
            }
        }
    }

    /// Cheap focus-regain path: balances only, no identity re-check. Focus
    /// fires far more often than visibility changes.
    pub async fn on_focus_regain(&self) {
        self.refresh_balance().await;
    }

    // ============================================================================
    // Internal helpers
    // ============================================================================

    fn persist_connection(
        &self,
        address: Address,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.records.save(&PersistedRecord::new(address, now))?;
        self.cookies.set(
            WALLET_CONNECTED_COOKIE,
            "true",
            self.config.session_ttl.num_seconds(),
        )?;
        Ok(())
    }

    fn clear_durable(&self) -> Result<(), SessionError> {
        self.records.clear()?;
        self.cookies.clear(WALLET_CONNECTED_COOKIE)?;
        Ok(())
    }

    /// Reset everything (in-memory, subscriptions, durable state). Durable
    /// clearing failures are logged, not raised; used on paths where a
    /// storage hiccup must not block the logout.
    fn clear_all(&self, reason: &str) {
        log::debug!("Clearing session state: {}", reason);
        let subs = {
            let mut session = self.state.lock().unwrap();
            let subs = mem::take(&mut session.subscriptions);
            session.reset();
            subs
        };
        self.drop_subscriptions(subs);
        if let Err(e) = self.clear_durable() {
            log::warn!("Failed to clear persisted session: {}", e);
        }
    }

    /// Reset after a failed connect: state cleared, then the failure kept
    /// visible in `last_error`. Returns the error for propagation.
    fn fail_connect(&self, err: SessionError) -> SessionError {
        log::warn!("Wallet connect failed: {}", err);
        let subs = {
            let mut session = self.state.lock().unwrap();
            let subs = mem::take(&mut session.subscriptions);
            session.reset();
            session.last_error = Some(err.to_string());
            subs
        };
        self.drop_subscriptions(subs);
        if let Err(e) = self.clear_durable() {
            log::warn!("Failed to clear persisted session: {}", e);
        }
        err
    }

    fn subscribe_changes(&self) -> Vec<SubscriptionId> {
        let mut subs = Vec::new();
        for event in [ProviderEvent::AccountsChanged, ProviderEvent::ChainChanged] {
            match self.provider.subscribe(event) {
                Ok(id) => subs.push(id),
                Err(e) => log::warn!("Failed to subscribe to {:?}: {}", event, e),
            }
        }
        subs
    }

    fn drop_subscriptions(&self, subs: Vec<SubscriptionId>) {
        for id in subs {
            if let Err(e) = self.provider.unsubscribe(id) {
                log::warn!("Failed to release subscription {:?}: {}", id, e);
            }
        }
    }
}
