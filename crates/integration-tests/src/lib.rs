//! Integration tests for Blossom.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p blossom-integration-tests
//! ```
//!
//! No external services are needed. Each test starts a [`MockBackend`], an
//! in-process `axum` server that speaks the storefront REST API, records
//! every request it receives, and can be scripted to fail.
//!
//! # Test Categories
//!
//! - `checkout` - Idempotency keys across submits, retries, and revisions
//! - `session` - Sign-in persistence and 401 handling
//! - `catalog` - Product listing, caching, codes, and stores
//! - `responses` - Rejection of malformed or invalid backend bodies
//!
//! # Example
//!
//! ```rust,no_run
//! use blossom_integration_tests::{MockBackend, Reply};
//! use axum::http::{Method, StatusCode};
//!
//! # async fn run() {
//! let backend = MockBackend::start().await;
//! backend.script(Method::POST, "/orders", Reply::status(StatusCode::SERVICE_UNAVAILABLE));
//! let client = backend.signed_in_client().await;
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;
mod fixtures;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, Method, StatusCode};
use blossom_core::IdempotencyKey;
use blossom_storefront::checkout::RetryPolicy;
use blossom_storefront::types::LoginRequest;
use blossom_storefront::{ApiClient, ClientConfig, Session};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use backend::Backend;

pub use fixtures::{ADMIN_LOGIN, ADMIN_TOKEN, MEMBER_ID, MEMBER_LOGIN, MEMBER_TOKEN, PASSWORD};

// =============================================================================
// Recorded requests
// =============================================================================

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below `/api/v1`.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Parsed JSON body, if there was one.
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Value of the `Idempotency-Key` header.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.headers
            .get(IdempotencyKey::HEADER)
            .and_then(|value| value.to_str().ok())
    }

    /// Bearer token from the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

// =============================================================================
// Scripted replies
// =============================================================================

/// A canned response that overrides the backend's normal handling once.
#[derive(Debug, Clone)]
pub struct Reply {
    pub(crate) status: StatusCode,
    pub(crate) body: String,
    pub(crate) after_processing: bool,
}

impl Reply {
    /// An error status with a `{"message"}` body.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        let message = status.canonical_reason().unwrap_or("error");
        Self::json(status, &json!({ "message": message }))
    }

    /// A JSON body.
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::raw(status, body.to_string())
    }

    /// An arbitrary body, sent as-is.
    #[must_use]
    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            after_processing: false,
        }
    }

    /// Let the backend handle the request first, then answer with this reply.
    ///
    /// Models a request that took effect but whose response was lost.
    #[must_use]
    pub const fn after_processing(mut self) -> Self {
        self.after_processing = true;
        self
    }
}

#[derive(Debug)]
pub(crate) struct Script {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) reply: Reply,
}

// =============================================================================
// MockBackend
// =============================================================================

pub(crate) type Shared = Arc<Mutex<Backend>>;

pub(crate) fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storefront backend bound to an ephemeral local port.
///
/// The server task stops when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with the default catalog.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend::seeded()));
        let app = Router::new()
            .fallback(backend::handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock backend error: {e}");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Origin of the backend, e.g. `http://127.0.0.1:41234`.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock backend URL is valid")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.url());
        config.timeout = Duration::from_secs(5);
        config
    }

    /// Client with a fresh in-memory session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.client_with(Session::in_memory())
    }

    /// Client bound to the given session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client_with(&self, session: Session) -> ApiClient {
        ApiClient::new(&self.config(), session).expect("Failed to build client")
    }

    /// Client signed in as the regular test member.
    ///
    /// # Panics
    ///
    /// Panics if sign-in fails.
    pub async fn signed_in_client(&self) -> ApiClient {
        let client = self.client();
        client
            .login(&LoginRequest::new(MEMBER_LOGIN, PASSWORD))
            .await
            .expect("Test member sign-in failed");
        client
    }

    /// Answer the next matching request with `reply` instead of the default.
    ///
    /// Scripts are consumed in order, one per matching request.
    pub fn script(&self, method: Method, path: &str, reply: Reply) {
        lock(&self.state).scripts.push_back(Script {
            method,
            path: path.to_string(),
            reply,
        });
    }

    /// Serve `GET /products` as a bare array instead of a page.
    pub fn serve_legacy_listing(&self) {
        lock(&self.state).legacy_listing = true;
    }

    /// Replace the catalog.
    pub fn set_products(&self, products: Vec<Value>) {
        lock(&self.state).products = products;
    }

    /// Put a line straight into the member's cart.
    pub fn seed_cart_item(&self, product_id: i64, quantity: i64) {
        lock(&self.state).add_cart_item(product_id, quantity, Vec::new());
    }

    /// Make every issued token invalid, as if the backend restarted.
    pub fn expire_tokens(&self) {
        lock(&self.state).tokens_valid = false;
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests received for one method and path.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        lock(&self.state)
            .requests
            .iter()
            .filter(|request| &request.method == method && request.path == path)
            .cloned()
            .collect()
    }

    /// Orders the backend has created.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.state)
            .orders
            .iter()
            .map(|stored| stored.order.clone())
            .collect()
    }

    /// Payments the backend has accepted.
    #[must_use]
    pub fn payment_count(&self) -> usize {
        lock(&self.state).payments.len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Retry policy without delays, for tests.
#[must_use]
pub const fn immediate_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }
}
