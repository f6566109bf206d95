//! Browser fallback when no native shell is present.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use super::{BridgeError, NativeBridge, NativeCallbacks, Platform, receive_capture};

/// Bytes returned by the mock camera.
pub const MOCK_CAPTURE: &[u8] = b"base64_mock_image_data";

/// Logs requests and serves a mock camera.
#[derive(Debug, Clone)]
pub struct WebBridge {
    callbacks: NativeCallbacks,
}

impl WebBridge {
    #[must_use]
    pub const fn new(callbacks: NativeCallbacks) -> Self {
        Self { callbacks }
    }
}

#[async_trait]
impl NativeBridge for WebBridge {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    fn reload(&self) -> Result<(), BridgeError> {
        info!("Reload requested");
        Ok(())
    }

    fn show_toast(&self, message: &str) -> Result<(), BridgeError> {
        info!(message, "Toast");
        Ok(())
    }

    async fn open_camera(&self) -> Result<Vec<u8>, BridgeError> {
        info!("Opening mock camera");
        let rx = self.callbacks.await_camera();
        self.callbacks.deliver_camera_result(STANDARD.encode(MOCK_CAPTURE));
        receive_capture(rx).await
    }

    fn register_push_token(&self) -> Result<(), BridgeError> {
        info!("Push token registration is not available outside the app");
        Ok(())
    }

    fn vibrate(&self, duration: Duration) -> Result<(), BridgeError> {
        debug!(duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), "Vibrate");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_camera() {
        let bridge = WebBridge::new(NativeCallbacks::detached());
        assert_eq!(bridge.open_camera().await.unwrap(), MOCK_CAPTURE.to_vec());
    }

    #[test]
    fn test_other_calls_are_no_ops() {
        let bridge = WebBridge::new(NativeCallbacks::detached());
        assert!(bridge.reload().is_ok());
        assert!(bridge.show_toast("hi").is_ok());
        assert!(bridge.register_push_token().is_ok());
        assert!(bridge.vibrate(Duration::from_millis(100)).is_ok());
    }
}
