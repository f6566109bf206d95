//! REST client for the storefront backend.
//!
//! Uses `reqwest` 0.13 for HTTP. Every response body is decoded with `serde`
//! and then checked with [`Validate`]; anything that fails either step is
//! reported as [`ApiError::MalformedResponse`] and never returned.
//! The product list and system codes are cached with `moka`.

mod auth;
mod cache;
mod cart;
mod orders;
mod payments;
mod products;
mod stores;
mod system;

use std::sync::Arc;
use std::time::Duration;

use blossom_core::IdempotencyKey;
use moka::future::Cache;
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;
use crate::validate::Validate;

use cache::{CacheKey, CacheValue};

/// Path prefix of every versioned endpoint.
const API_PREFIX: &str = "api/v1";

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, cache, and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl ApiClient {
    /// Create a client bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::Client)?;

        let cache = (config.catalog_ttl > Duration::ZERO).then(|| {
            Cache::builder()
                .max_capacity(100)
                .time_to_live(config.catalog_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: with_trailing_slash(config.api_base_url.clone()),
                session,
                cache,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.as_ref()?.get(key).await;
        if value.is_some() {
            debug!(?key, "Cache hit");
        }
        value
    }

    async fn cache_insert(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// Fail with `Forbidden` unless an admin is signed in.
    fn require_admin(&self) -> Result<(), ApiError> {
        let session = &self.inner.session;
        if !session.is_authenticated() {
            return Err(ApiError::NotSignedIn);
        }
        if !session.is_admin() {
            return Err(ApiError::Forbidden(
                "back-office role required".to_string(),
            ));
        }
        Ok(())
    }

    fn url(&self, call: &Call<'_>) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(&format!("{API_PREFIX}{}", call.path))?;
        if !call.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(call.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Send a call and decode the validated response body.
    ///
    /// Read-only calls are retried once after a transient failure.
    pub(crate) async fn fetch<T>(&self, call: Call<'_>) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let body = self.send_with_read_retry(&call).await?;
        decode(&body)
    }

    /// Send a call whose response body is not needed.
    pub(crate) async fn execute(&self, call: Call<'_>) -> Result<(), ApiError> {
        self.send_with_read_retry(&call).await.map(|_| ())
    }

    async fn send_with_read_retry(&self, call: &Call<'_>) -> Result<String, ApiError> {
        match self.send(call).await {
            Err(e) if call.method == Method::GET && e.is_retryable() => {
                warn!(path = call.path, error = %e, "Transient failure on read, retrying once");
                self.send(call).await
            }
            result => result,
        }
    }

    /// One HTTP attempt.
    #[instrument(
        skip(self, call),
        fields(
            method = %call.method,
            path = call.path,
            idempotency_key = call.idempotency_key.map(IdempotencyKey::as_str),
        )
    )]
    async fn send(&self, call: &Call<'_>) -> Result<String, ApiError> {
        let url = self.url(call)?;

        let mut request = self
            .inner
            .http
            .request(call.method.clone(), url)
            .header(ACCEPT, "application/json");
        if let Some(body) = &call.body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        if let Some(key) = call.idempotency_key {
            request = request.header(IdempotencyKey::HEADER, key.as_str());
        }
        if let Some(token) = self.inner.session.bearer_token() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            ApiError::Network(e)
        })?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::Network)?;

        if status.is_success() {
            debug!(status = %status, "Request succeeded");
            return Ok(text);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Session rejected by backend, signing out");
            if let Err(e) = self.inner.session.sign_out() {
                tracing::error!(error = %e, "Failed to clear persisted session");
            }
        }

        let err = ApiError::from_response(status, &text);
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            warn!(status = %status, error = %err, "Backend rejected request");
        }
        Err(err)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .field("cache", &self.inner.cache.is_some())
            .finish()
    }
}

/// Decode a success body and check its invariants.
fn decode<T>(body: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(body).map_err(|e| {
        warn!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Response did not match the expected shape"
        );
        ApiError::MalformedResponse(e.to_string())
    })?;
    value.validate().map_err(|e| {
        warn!(error = %e, "Response failed validation");
        ApiError::MalformedResponse(e.to_string())
    })?;
    Ok(value)
}

/// `Url::join` drops the last path segment unless it ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// =============================================================================
// Call
// =============================================================================

/// A single API call, relative to the versioned prefix.
#[derive(Debug)]
pub(crate) struct Call<'a> {
    method: Method,
    path: &'a str,
    query: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
    idempotency_key: Option<&'a IdempotencyKey>,
}

impl<'a> Call<'a> {
    fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            idempotency_key: None,
        }
    }

    pub(crate) fn get(path: &'a str) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: &'a str) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put(path: &'a str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn patch(path: &'a str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub(crate) fn delete(path: &'a str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub(crate) fn query_pairs(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let encoded = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        self.body = Some(encoded);
        Ok(self)
    }

    pub(crate) const fn idempotency_key(mut self, key: &'a IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(Url::parse(base).unwrap());
        ApiClient::new(&config, Session::in_memory()).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = client("http://localhost:8080");
        let call = Call::get("/products").query("page", 0).query("size", 20);
        assert_eq!(
            client.url(&call).unwrap().as_str(),
            "http://localhost:8080/api/v1/products?page=0&size=20"
        );

        let call = Call::get("/orders/42");
        assert_eq!(
            client.url(&call).unwrap().as_str(),
            "http://localhost:8080/api/v1/orders/42"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = client("https://example.com/shop");
        let call = Call::get("/system/codes");
        assert_eq!(
            client.url(&call).unwrap().as_str(),
            "https://example.com/shop/api/v1/system/codes"
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let client = client("http://localhost:8080");
        let call = Call::get("/stores/nearby").query("keyword", "rose & lily");
        assert_eq!(
            client.url(&call).unwrap().query(),
            Some("keyword=rose+%26+lily")
        );
    }

    #[test]
    fn test_decode_rejects_invalid_values() {
        let err = decode::<crate::types::Cart>(r#"{"items": [], "totalPrice": -1, "totalQuantity": 0}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let err = decode::<crate::types::Cart>("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn test_admin_check_is_local() {
        let client = client("http://localhost:8080");
        assert!(matches!(client.require_admin(), Err(ApiError::NotSignedIn)));
    }
}
