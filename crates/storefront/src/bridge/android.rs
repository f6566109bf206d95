//! Android shell bridge (`wnInterface` JavaScript interface).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{BridgeError, NativeBridge, NativeCallbacks, Platform, receive_capture};

/// Methods exposed by the Android shell.
///
/// Calls are fire-and-forget; asynchronous results come back through
/// [`NativeCallbacks`].
pub trait AndroidHost: Send + Sync {
    /// Reload the web view.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn reload(&self) -> Result<(), BridgeError>;

    /// Show a toast.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn show_toast(&self, message: &str) -> Result<(), BridgeError>;

    /// Open the camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn open_camera(&self) -> Result<(), BridgeError>;

    /// Request the push token.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn register_push_token(&self) -> Result<(), BridgeError>;

    /// Vibrate for `millis` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the call.
    fn vibrate(&self, millis: u64) -> Result<(), BridgeError>;
}

/// Bridge that calls the Android shell directly.
pub struct AndroidBridge {
    host: Arc<dyn AndroidHost>,
    callbacks: NativeCallbacks,
}

impl AndroidBridge {
    #[must_use]
    pub fn new(host: Arc<dyn AndroidHost>, callbacks: NativeCallbacks) -> Self {
        Self { host, callbacks }
    }
}

#[async_trait]
impl NativeBridge for AndroidBridge {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn reload(&self) -> Result<(), BridgeError> {
        self.host.reload()
    }

    fn show_toast(&self, message: &str) -> Result<(), BridgeError> {
        self.host.show_toast(message)
    }

    async fn open_camera(&self) -> Result<Vec<u8>, BridgeError> {
        let rx = self.callbacks.await_camera();
        self.host.open_camera()?;
        debug!("Waiting for Android camera result");
        receive_capture(rx).await
    }

    fn register_push_token(&self) -> Result<(), BridgeError> {
        self.host.register_push_token()
    }

    fn vibrate(&self, duration: Duration) -> Result<(), BridgeError> {
        self.host
            .vibrate(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
