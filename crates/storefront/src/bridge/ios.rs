//! iOS shell bridge (`webkit.messageHandlers.wnInterface`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{BridgeError, NativeBridge, NativeCallbacks, Platform, receive_capture};

/// Message posted to the iOS shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum IosMessage {
    Reload,
    ShowToast { message: String },
    OpenCamera,
    RegisterPushToken,
    Vibrate { duration: u64 },
}

/// Receives JSON messages on the iOS side.
pub trait MessageHandler: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell rejects the message.
    fn post_message(&self, message: serde_json::Value) -> Result<(), BridgeError>;
}

/// Bridge that posts messages to the iOS shell.
pub struct IosBridge {
    handler: Arc<dyn MessageHandler>,
    callbacks: NativeCallbacks,
}

impl IosBridge {
    #[must_use]
    pub fn new(handler: Arc<dyn MessageHandler>, callbacks: NativeCallbacks) -> Self {
        Self { handler, callbacks }
    }

    fn post(&self, message: &IosMessage) -> Result<(), BridgeError> {
        self.handler.post_message(serde_json::to_value(message)?)
    }
}

#[async_trait]
impl NativeBridge for IosBridge {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn reload(&self) -> Result<(), BridgeError> {
        self.post(&IosMessage::Reload)
    }

    fn show_toast(&self, message: &str) -> Result<(), BridgeError> {
        self.post(&IosMessage::ShowToast {
            message: message.to_string(),
        })
    }

    async fn open_camera(&self) -> Result<Vec<u8>, BridgeError> {
        let rx = self.callbacks.await_camera();
        self.post(&IosMessage::OpenCamera)?;
        debug!("Waiting for iOS camera result");
        receive_capture(rx).await
    }

    fn register_push_token(&self) -> Result<(), BridgeError> {
        self.post(&IosMessage::RegisterPushToken)
    }

    fn vibrate(&self, duration: Duration) -> Result<(), BridgeError> {
        self.post(&IosMessage::Vibrate {
            duration: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<serde_json::Value>>,
    }

    impl MessageHandler for Recorder {
        fn post_message(&self, message: serde_json::Value) -> Result<(), BridgeError> {
            self.messages.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[test]
    fn test_message_shapes() {
        let recorder = Arc::new(Recorder::default());
        let bridge = IosBridge::new(recorder.clone(), NativeCallbacks::detached());

        bridge.reload().unwrap();
        bridge.show_toast("Saved").unwrap();
        bridge.register_push_token().unwrap();
        bridge.vibrate(Duration::from_millis(50)).unwrap();

        assert_eq!(
            *recorder.messages.lock().unwrap(),
            vec![
                json!({"action": "reload"}),
                json!({"action": "showToast", "message": "Saved"}),
                json!({"action": "registerPushToken"}),
                json!({"action": "vibrate", "duration": 50}),
            ]
        );
    }

    #[tokio::test]
    async fn test_camera_waits_for_callback() {
        let recorder = Arc::new(Recorder::default());
        let callbacks = NativeCallbacks::detached();
        let bridge = IosBridge::new(recorder.clone(), callbacks.clone());

        let capture = tokio::spawn(async move { bridge.open_camera().await });
        // Let the request register before answering it.
        while recorder.messages.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(callbacks.deliver_camera_result("aGVsbG8="));

        assert_eq!(capture.await.unwrap().unwrap(), b"hello".to_vec());
        assert_eq!(
            recorder.messages.lock().unwrap()[0],
            json!({"action": "openCamera"})
        );
    }
}
