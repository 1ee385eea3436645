//! Request/response boundary for hosts driving the recorder.
//!
//! [`ControlSurface`] adapts a [`ScreenRecorder`] to callers that speak in
//! serializable shapes: requests carry camelCase options, results serialize
//! in camelCase and failures cross as [`ErrorResponse`] with a stable code.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::recorder::ScreenRecorder;
use crate::session::{RecordingSummary, StartOptions};
use crate::state::RecorderState;
use crate::RecorderError;

/// Result of `get_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    /// `"idle"`, `"recording"` or `"stopping"`.
    pub state: RecorderState,
}

/// A failure as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct ErrorResponse {
    /// Stable code such as `ERR_RECORDER_BUSY`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl From<RecorderError> for ErrorResponse {
    fn from(error: RecorderError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// A control request in wire form.
///
/// ```
/// use screen_recorder::ControlRequest;
///
/// let request: ControlRequest =
///     serde_json::from_str(r#"{ "method": "startRecording", "params": { "mic": false } }"#).unwrap();
/// assert!(matches!(request, ControlRequest::StartRecording(options) if !options.mic));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ControlRequest {
    /// Whether capture is possible on this device.
    IsAvailable,
    /// Current recorder state.
    GetState,
    /// Start a recording.
    StartRecording(StartOptions),
    /// Stop and keep the active recording.
    StopRecording,
    /// Cancel and delete the active recording.
    CancelRecording,
}

/// Host-facing wrapper around a [`ScreenRecorder`].
#[derive(Debug, Clone)]
pub struct ControlSurface {
    recorder: ScreenRecorder,
}

impl ControlSurface {
    /// Wraps `recorder`.
    pub fn new(recorder: ScreenRecorder) -> Self {
        Self { recorder }
    }

    /// The wrapped recorder.
    pub fn recorder(&self) -> &ScreenRecorder {
        &self.recorder
    }

    /// Whether capture is possible on this device.
    pub fn is_available(&self) -> bool {
        self.recorder.is_available()
    }

    /// Current state.
    pub fn get_state(&self) -> StateResponse {
        StateResponse {
            state: self.recorder.state(),
        }
    }

    /// Starts a recording with `options`.
    pub async fn start_recording(&self, options: StartOptions) -> Result<(), ErrorResponse> {
        self.recorder.start(options).await.map_err(ErrorResponse::from)
    }

    /// Stops the active recording and returns its summary.
    pub async fn stop_recording(&self) -> Result<RecordingSummary, ErrorResponse> {
        self.recorder.stop().await.map_err(ErrorResponse::from)
    }

    /// Cancels the active recording. Returns `false` if there was none.
    pub async fn cancel_recording(&self) -> bool {
        self.recorder.cancel().await
    }

    /// Executes a wire request and returns its JSON result.
    ///
    /// `startRecording` succeeds with `null`.
    pub async fn dispatch(&self, request: ControlRequest) -> Result<Value, ErrorResponse> {
        tracing::debug!(?request, "Control request");

        match request {
            ControlRequest::IsAvailable => Ok(Value::Bool(self.is_available())),
            ControlRequest::GetState => to_value(&self.get_state()),
            ControlRequest::StartRecording(options) => {
                self.start_recording(options).await?;
                Ok(Value::Null)
            }
            ControlRequest::StopRecording => to_value(&self.stop_recording().await?),
            ControlRequest::CancelRecording => Ok(Value::Bool(self.cancel_recording().await)),
        }
    }

    /// Parses a JSON request and executes it.
    ///
    /// Malformed requests fail with code `ERR_INVALID_REQUEST`.
    pub async fn dispatch_json(&self, request: &str) -> Result<Value, ErrorResponse> {
        let request = serde_json::from_str(request).map_err(|e| ErrorResponse {
            code: "ERR_INVALID_REQUEST".to_string(),
            message: e.to_string(),
        })?;
        self.dispatch(request).await
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ErrorResponse> {
    serde_json::to_value(value).map_err(|e| ErrorResponse {
        code: "ERR_INTERNAL".to_string(),
        message: e.to_string(),
    })
}
