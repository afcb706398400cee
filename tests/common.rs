//! Common test utilities for session lifecycle integration tests
//!
//! Provides a scripted mock wallet provider and a test environment wiring
//! the session manager to in-memory storage collaborators.

// Not every test target uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lendx_session::{
    Address, Amount, MemoryCookieJar, MemoryStore, ProviderError, ProviderEvent, SessionConfig,
    SessionManager, SubscriptionId, TokenSymbol, WalletProvider,
};
use tokio::sync::Semaphore;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

pub fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

pub const ADDR_A: &str = "0x1111111111111111111111111111111111111111";
pub const ADDR_B: &str = "0x2222222222222222222222222222222222222222";

/// How the mock answers `request_connection`.
#[derive(Clone, Copy)]
pub enum ConnectBehavior {
    /// Grant this address and make it the active account
    Grant(Address),
    /// Wallet answers with an empty account list
    EmptyAccounts,
    /// User dismissed the prompt
    Reject,
    /// No wallet extension injected
    Unavailable,
}

#[derive(Default)]
struct MockState {
    active_address: Option<Address>,
    connect_behavior: Option<ConnectBehavior>,
    balances: HashMap<TokenSymbol, Amount>,
    fail_balances: bool,
    fail_active_query: bool,
    revoke_unsupported: bool,

    request_connection_calls: u32,
    active_address_calls: u32,
    balance_calls: u32,
    revoke_calls: u32,
    subscribe_calls: u32,
    unsubscribe_calls: u32,
    next_sub_id: u64,
    active_subs: HashSet<u64>,
}

/// Scripted in-memory wallet provider.
///
/// Optional semaphore gates let a test hold a connect or balance query
/// in flight to exercise the reentrancy and stale-write guards.
pub struct MockProvider {
    state: Mutex<MockState>,
    balance_gate: Mutex<Option<Arc<Semaphore>>>,
    connect_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            balance_gate: Mutex::new(None),
            connect_gate: Mutex::new(None),
        }
    }

    pub fn set_active_address(&self, address: Option<Address>) {
        self.state.lock().unwrap().active_address = address;
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        self.state.lock().unwrap().connect_behavior = Some(behavior);
    }

    pub fn set_balance(&self, symbol: TokenSymbol, decimal: &str) {
        let amount = Amount::parse(decimal, symbol).unwrap();
        self.state.lock().unwrap().balances.insert(symbol, amount);
    }

    pub fn set_fail_balances(&self, fail: bool) {
        self.state.lock().unwrap().fail_balances = fail;
    }

    pub fn set_fail_active_query(&self, fail: bool) {
        self.state.lock().unwrap().fail_active_query = fail;
    }

    pub fn set_revoke_unsupported(&self, unsupported: bool) {
        self.state.lock().unwrap().revoke_unsupported = unsupported;
    }

    /// Make every `query_balance` block until permits are released.
    pub fn gate_balances(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.balance_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Make every `request_connection` block until permits are released.
    pub fn gate_connects(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.connect_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn request_connection_calls(&self) -> u32 {
        self.state.lock().unwrap().request_connection_calls
    }

    pub fn active_address_calls(&self) -> u32 {
        self.state.lock().unwrap().active_address_calls
    }

    pub fn balance_calls(&self) -> u32 {
        self.state.lock().unwrap().balance_calls
    }

    pub fn revoke_calls(&self) -> u32 {
        self.state.lock().unwrap().revoke_calls
    }

    pub fn subscribe_calls(&self) -> u32 {
        self.state.lock().unwrap().subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> u32 {
        self.state.lock().unwrap().unsubscribe_calls
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().unwrap().active_subs.len()
    }

    async fn wait_gate(gate: Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn get_active_address(&self) -> Result<Option<Address>, ProviderError> {
        let (fail, active) = {
            let mut state = self.state.lock().unwrap();
            state.active_address_calls += 1;
            (state.fail_active_query, state.active_address)
        };
        if fail {
            return Err(ProviderError::Rpc("wallet bridge down".to_string()));
        }
        Ok(active)
    }

    async fn request_connection(&self) -> Result<Option<Address>, ProviderError> {
        let (gate, behavior) = {
            let mut state = self.state.lock().unwrap();
            state.request_connection_calls += 1;
            (
                self.connect_gate.lock().unwrap().clone(),
                state.connect_behavior,
            )
        };
        Self::wait_gate(gate).await;

        match behavior {
            Some(ConnectBehavior::Grant(address)) => {
                self.state.lock().unwrap().active_address = Some(address);
                Ok(Some(address))
            }
            Some(ConnectBehavior::EmptyAccounts) => Ok(None),
            Some(ConnectBehavior::Reject) => Err(ProviderError::Rejected),
            Some(ConnectBehavior::Unavailable) | None => Err(ProviderError::Unavailable),
        }
    }

    async fn query_balance(&self, symbol: TokenSymbol) -> Result<Amount, ProviderError> {
        let (gate, fail, amount) = {
            let mut state = self.state.lock().unwrap();
            state.balance_calls += 1;
            (
                self.balance_gate.lock().unwrap().clone(),
                state.fail_balances,
                state
                    .balances
                    .get(&symbol)
                    .copied()
                    .unwrap_or_else(|| Amount::zero(symbol)),
            )
        };
        Self::wait_gate(gate).await;

        if fail {
            return Err(ProviderError::Rpc("balance query failed".to_string()));
        }
        Ok(amount)
    }

    async fn revoke_permissions(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.revoke_calls += 1;
        if state.revoke_unsupported {
            return Err(ProviderError::Unsupported(
                "wallet_revokePermissions".to_string(),
            ));
        }
        state.active_address = None;
        Ok(())
    }

    fn subscribe(&self, _event: ProviderEvent) -> Result<SubscriptionId, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.subscribe_calls += 1;
        let id = state.next_sub_id;
        state.next_sub_id += 1;
        state.active_subs.insert(id);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.unsubscribe_calls += 1;
        if !state.active_subs.remove(&id.0) {
            return Err(ProviderError::Rpc(format!("unknown subscription {:?}", id)));
        }
        Ok(())
    }
}

/// Test environment: one mock wallet, shared in-memory storage, and a
/// session manager wired to them.
pub struct TestEnv {
    pub provider: Arc<MockProvider>,
    pub store: Arc<MemoryStore>,
    pub cookies: Arc<MemoryCookieJar>,
    pub manager: Arc<SessionManager>,
}

impl TestEnv {
    pub fn new() -> Self {
        init_logging();
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let cookies = Arc::new(MemoryCookieJar::new());
        let manager = Arc::new(SessionManager::new_with_collaborators(
            provider.clone(),
            store.clone(),
            cookies.clone(),
            SessionConfig::default(),
        ));
        Self {
            provider,
            store,
            cookies,
            manager,
        }
    }

    /// A second manager over the same wallet and storage, simulating a page
    /// reload in the same browser.
    pub fn reloaded_manager(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::new_with_collaborators(
            self.provider.clone(),
            self.store.clone(),
            self.cookies.clone(),
            SessionConfig::default(),
        ))
    }
}
