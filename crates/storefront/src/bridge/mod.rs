//! Native app shell integration.
//!
//! The storefront runs inside an Android or iOS web view shell, or on its
//! own. [`Platform::detect`] picks the platform once from the user agent and
//! [`Platform::bridge`] returns the matching [`NativeBridge`]. When the shell
//! for the detected platform is missing, the web fallback is used.
//!
//! The shell answers asynchronous requests (camera captures, push tokens)
//! through [`NativeCallbacks`].

mod android;
mod ios;
mod web;

use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

use crate::session::Session;

pub use android::{AndroidBridge, AndroidHost};
pub use ios::{IosBridge, IosMessage, MessageHandler};
pub use web::{MOCK_CAPTURE, WebBridge};

static ANDROID_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Android").expect("Invalid regex"));

static IOS_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)iPhone|iPad|iPod").expect("Invalid regex"));

/// Errors raised by the native bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("native shell rejected the call: {0}")]
    Host(String),
    #[error("camera request was superseded or the shell went away")]
    CameraCancelled,
    #[error("camera returned data that is not base64: {0}")]
    InvalidCapture(#[from] base64::DecodeError),
    #[error("failed to encode native message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Runtime platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    /// Classify a user agent string.
    #[must_use]
    pub fn detect(user_agent: &str) -> Self {
        if ANDROID_UA.is_match(user_agent) {
            Self::Android
        } else if IOS_UA.is_match(user_agent) {
            Self::Ios
        } else {
            Self::Web
        }
    }

    /// Build the bridge for this platform from whatever shells are present.
    #[must_use]
    pub fn bridge(self, hosts: NativeHosts, callbacks: NativeCallbacks) -> Arc<dyn NativeBridge> {
        let bridge: Arc<dyn NativeBridge> = match (self, hosts) {
            (Self::Android, NativeHosts { android: Some(host), .. }) => {
                Arc::new(AndroidBridge::new(host, callbacks))
            }
            (Self::Ios, NativeHosts { ios: Some(handler), .. }) => {
                Arc::new(IosBridge::new(handler, callbacks))
            }
            _ => Arc::new(WebBridge::new(callbacks)),
        };
        info!(platform = ?self, bridge = ?bridge.platform(), "Native bridge initialized");
        bridge
    }
}

/// Native shells available to the process.
#[derive(Clone, Default)]
pub struct NativeHosts {
    pub android: Option<Arc<dyn AndroidHost>>,
    pub ios: Option<Arc<dyn MessageHandler>>,
}

/// Capabilities provided by the native shell.
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Platform actually served by this bridge.
    fn platform(&self) -> Platform;

    /// Reload the web view.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn reload(&self) -> Result<(), BridgeError>;

    /// Show a native toast.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn show_toast(&self, message: &str) -> Result<(), BridgeError>;

    /// Open the camera and wait for the capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is superseded or the capture is not
    /// valid base64.
    async fn open_camera(&self) -> Result<Vec<u8>, BridgeError>;

    /// Ask the shell to deliver its push token through
    /// [`NativeCallbacks::deliver_push_token`].
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn register_push_token(&self) -> Result<(), BridgeError>;

    /// Vibrate the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn vibrate(&self, duration: Duration) -> Result<(), BridgeError>;
}

/// Entry points the native shell calls back into.
///
/// Cheap to clone; clones share pending requests.
#[derive(Clone)]
pub struct NativeCallbacks {
    camera: Arc<Mutex<Option<oneshot::Sender<String>>>>,
    push_token: Arc<watch::Sender<Option<String>>>,
    session: Option<Session>,
}

impl NativeCallbacks {
    /// Callbacks that remember push tokens in `session`.
    #[must_use]
    pub fn new(session: Session) -> Self {
        let (push_token, _) = watch::channel(session.push_token());
        Self {
            camera: Arc::new(Mutex::new(None)),
            push_token: Arc::new(push_token),
            session: Some(session),
        }
    }

    /// Callbacks without a session to persist push tokens into.
    #[must_use]
    pub fn detached() -> Self {
        let (push_token, _) = watch::channel(None);
        Self {
            camera: Arc::new(Mutex::new(None)),
            push_token: Arc::new(push_token),
            session: None,
        }
    }

    /// Register a pending camera request. A previous pending request is
    /// cancelled.
    pub(crate) fn await_camera(&self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tx);
        if previous.is_some() {
            warn!("Camera request superseded by a new one");
        }
        rx
    }

    /// Called by the shell with a base64 capture. Returns whether a request
    /// was waiting for it.
    pub fn deliver_camera_result(&self, data: impl Into<String>) -> bool {
        let pending = self
            .camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(tx) => tx.send(data.into()).is_ok(),
            None => {
                warn!("Camera result arrived with no pending request");
                false
            }
        }
    }

    /// Called by the shell with its push token.
    pub fn deliver_push_token(&self, token: impl Into<String>) {
        let token = token.into();
        info!("Received push token");
        if let Some(session) = &self.session
            && let Err(e) = session.set_push_token(token.clone())
        {
            warn!(error = %e, "Failed to store push token");
        }
        self.push_token.send_replace(Some(token));
    }

    /// Watch for push tokens.
    #[must_use]
    pub fn push_tokens(&self) -> watch::Receiver<Option<String>> {
        self.push_token.subscribe()
    }
}

impl std::fmt::Debug for NativeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let camera_pending = self
            .camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("NativeCallbacks")
            .field("camera_pending", &camera_pending)
            .field("push_token", &self.push_token.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// Wait for the shell to deliver a capture and decode it.
pub(crate) async fn receive_capture(rx: oneshot::Receiver<String>) -> Result<Vec<u8>, BridgeError> {
    let encoded = rx.await.map_err(|_| BridgeError::CameraCancelled)?;
    Ok(STANDARD.decode(encoded.trim())?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platform() {
        assert_eq!(
            Platform::detect("Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36"),
            Platform::Android
        );
        assert_eq!(
            Platform::detect("Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X)"),
            Platform::Ios
        );
        assert_eq!(Platform::detect("Mozilla/5.0 (iPad; CPU OS 17_0)"), Platform::Ios);
        assert_eq!(Platform::detect("mozilla/5.0 (linux; android 13)"), Platform::Android);
        assert_eq!(
            Platform::detect("Mozilla/5.0 (X11; Linux x86_64) Firefox/125.0"),
            Platform::Web
        );
        assert_eq!(Platform::detect("blossom-storefront/0.1.0"), Platform::Web);
    }

    #[test]
    fn test_missing_shell_falls_back_to_web() {
        let bridge = Platform::Android.bridge(NativeHosts::default(), NativeCallbacks::detached());
        assert_eq!(bridge.platform(), Platform::Web);
    }

    #[tokio::test]
    async fn test_camera_result_resolves_pending_request() {
        let callbacks = NativeCallbacks::detached();
        let rx = callbacks.await_camera();
        assert!(callbacks.deliver_camera_result(STANDARD.encode(b"jpeg bytes")));
        assert_eq!(receive_capture(rx).await.unwrap(), b"jpeg bytes".to_vec());

        assert!(!callbacks.deliver_camera_result("late"));
    }

    #[tokio::test]
    async fn test_superseded_camera_request_is_cancelled() {
        let callbacks = NativeCallbacks::detached();
        let first = callbacks.await_camera();
        let _second = callbacks.await_camera();
        assert!(matches!(
            receive_capture(first).await,
            Err(BridgeError::CameraCancelled)
        ));
    }

    #[tokio::test]
    async fn test_invalid_capture_is_rejected() {
        let callbacks = NativeCallbacks::detached();
        let rx = callbacks.await_camera();
        callbacks.deliver_camera_result("not base64!");
        assert!(matches!(
            receive_capture(rx).await,
            Err(BridgeError::InvalidCapture(_))
        ));
    }

    #[test]
    fn test_push_token_is_stored_in_session() {
        let session = Session::in_memory();
        let callbacks = NativeCallbacks::new(session.clone());
        let rx = callbacks.push_tokens();

        callbacks.deliver_push_token("fcm-123");
        assert_eq!(session.push_token().as_deref(), Some("fcm-123"));
        assert_eq!(rx.borrow().as_deref(), Some("fcm-123"));
    }
}
