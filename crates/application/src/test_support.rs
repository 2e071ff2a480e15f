//! In-memory stand-ins for the ports, used by unit and integration tests.
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream test suites.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tally_domain::{LoginCredential, Route};
use tally_domain::request::RequestSpec;
use tally_domain::response::ResponseSpec;

use crate::api_client::ApiClient;
use crate::auth::AuthService;
use crate::config::AuthSettings;
use crate::storage::{AppStorage, TokenStorage};
use crate::ports::{
    CloudStorage, CloudStorageError, HttpClient, HttpClientError, KeyValueStore,
    KeyValueStoreError, Navigator,
};

/// User id issued by [`FakeBackend`].
pub const FAKE_USER_ID: &str = "42";

/// Map-backed [`KeyValueStore`].
#[derive(Default)]
pub struct MapStore(Mutex<HashMap<String, String>>);

impl MapStore {
    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.0.lock().insert(key.to_string(), value.to_string());
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.0.lock().get(key).cloned()
    }
}

impl KeyValueStore for MapStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.0.lock().remove(key);
        Ok(())
    }
}

/// Map-backed [`CloudStorage`] that can pretend to be unsupported.
///
/// `remove_delay` slows removals down, to let later writes race them.
pub struct FakeCloud {
    pub supported: bool,
    pub items: Mutex<HashMap<String, String>>,
    pub remove_delay: Mutex<Duration>,
}

impl FakeCloud {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            items: Mutex::new(HashMap::new()),
            remove_delay: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl CloudStorage for FakeCloud {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, CloudStorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), CloudStorageError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CloudStorageError> {
        let delay = *self.remove_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.items.lock().remove(key);
        Ok(())
    }
}

/// [`Navigator`] that records every navigation.
#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn last(&self) -> Option<Route> {
        self.routes.lock().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().push(route);
    }
}

/// Scripted budgeting backend.
///
/// Protected endpoints accept exactly one token at a time. Each successful
/// login or refresh issues `token-N` and invalidates the previous one.
pub struct FakeBackend {
    valid_token: Mutex<Option<String>>,
    issued: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub api_calls: AtomicUsize,
    pub login_ok: AtomicBool,
    pub refresh_ok: AtomicBool,
    pub refresh_delay: Mutex<Duration>,
    pub requests: Mutex<Vec<RequestSpec>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            valid_token: Mutex::new(None),
            issued: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            login_ok: AtomicBool::new(true),
            refresh_ok: AtomicBool::new(true),
            refresh_delay: Mutex::new(Duration::from_millis(50)),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    /// Makes `token` the only accepted token.
    pub fn accept_only(&self, token: Option<&str>) {
        *self.valid_token.lock() = token.map(String::from);
    }

    /// Returns the currently accepted token.
    pub fn valid_token(&self) -> Option<String> {
        self.valid_token.lock().clone()
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn api_requests(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    fn issue(&self) -> ResponseSpec {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{n}");
        *self.valid_token.lock() = Some(token.clone());
        ResponseSpec::json(200, &json!({"accessToken": token, "userId": FAKE_USER_ID}))
    }

    fn protected(&self, request: &RequestSpec, body: serde_json::Value) -> ResponseSpec {
        self.api_calls.fetch_add(1, Ordering::SeqCst);
        let accepted = self.valid_token.lock().clone();
        match (request.bearer_token(), accepted) {
            (Some(sent), Some(accepted)) if sent == accepted => {
                ResponseSpec::json(200, &json!({ "data": body }))
            }
            _ => ResponseSpec::json(401, &json!({"error": "Unauthorized"})),
        }
    }
}

#[async_trait]
impl HttpClient for FakeBackend {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        self.requests.lock().push(request.clone());

        match request.path.as_str() {
            "/auth/login" => {
                self.login_calls.fetch_add(1, Ordering::SeqCst);
                if self.login_ok.load(Ordering::SeqCst) {
                    Ok(self.issue())
                } else {
                    Ok(ResponseSpec::json(401, &json!({"error": "Telegram Auth Failed"})))
                }
            }
            "/auth/refresh" => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                let delay = *self.refresh_delay.lock();
                tokio::time::sleep(delay).await;
                if self.refresh_ok.load(Ordering::SeqCst) {
                    Ok(self.issue())
                } else {
                    Ok(ResponseSpec::json(401, &json!({"error": "Invalid or expired refresh token"})))
                }
            }
            "/user" => Ok(self.protected(request, json!({ "user_id": FAKE_USER_ID }))),
            "/budgeting/overview" => Ok(self.protected(request, sample_overview())),
            "/budgeting/transactions" => Ok(self.protected(request, sample_transactions())),
            other => Ok(ResponseSpec::json(404, &json!({ "error": format!("no route {other}") }))),
        }
    }
}

/// Auth service over `backend` with in-memory storage and no cloud mirror.
pub fn auth_service(
    backend: Arc<FakeBackend>,
    navigator: Arc<RecordingNavigator>,
    settings: AuthSettings,
) -> AuthService {
    let storage = Arc::new(AppStorage::load(Arc::new(MapStore::default())));
    let tokens = TokenStorage::new(storage, Arc::new(FakeCloud::new(false)));
    AuthService::new(backend, tokens, navigator, settings)
}

/// API client with a session already established against `backend`.
///
/// The background refresh timer is stopped so tests control every call.
pub async fn logged_in_client(
    backend: Arc<FakeBackend>,
    navigator: Arc<RecordingNavigator>,
    settings: AuthSettings,
) -> ApiClient {
    let auth = auth_service(backend.clone(), navigator, settings);
    auth.set_credential(Some(LoginCredential::InitData("query_id=test".to_string())));
    auth.login().await.expect("fake backend accepts the login");
    auth.stop_refresh_timer();
    ApiClient::new(backend, auth)
}

/// Overview payload with two spending categories in March.
pub fn sample_overview() -> serde_json::Value {
    json!({
        "currency": "EUR",
        "month": 3,
        "monthBalance": 1250.5,
        "monthIncome": 2000.0,
        "monthSpending": 749.5,
        "monthTransactions": [{
            "id": 7,
            "amount": 49.5,
            "category": "Food",
            "isIncome": false,
            "date": "2025-03-12",
            "description": "Groceries"
        }],
        "monthTransactionsCount": 1,
        "monthSummary": {"month": 3, "income": 2000.0, "spending": 749.5},
        "yearSummary": {
            "year": 2025,
            "monthly_summaries": [{"month": 3, "income": 2000.0, "spending": 749.5}],
            "monthly_spending_summaries": [
                {"name": "Food", "amounts": [0.0, 0.0, 49.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]},
                {"name": "Rent", "amounts": [0.0, 0.0, 700.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]}
            ]
        }
    })
}

/// Transactions payload with a single row.
pub fn sample_transactions() -> serde_json::Value {
    json!({
        "currency": "EUR",
        "year": 2025,
        "transactionsCount": 1,
        "transactionsCategories": ["Food", "Rent"],
        "transactions": [{
            "id": 7,
            "amount": 50.0,
            "category": "Food",
            "isIncome": false,
            "date": "2025-03-12",
            "description": "Groceries",
            "accumulatdedAmount": -49.5
        }]
    })
}
