//! Builder pattern for `ScreenRecorder`.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::machine::RecorderStateMachine;
use crate::recorder::ScreenRecorder;
use crate::source::CaptureSource;
use crate::state::StateCell;
use crate::writer::{FileContainerFactory, WriterFactory};
use crate::{event_callback, EventCallback, RecorderConfig, RecorderEvent};

/// Channel capacity for commands from recorder handles.
/// Commands are rare; a few slots let concurrent callers queue up.
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Builder for configuring a [`ScreenRecorder`].
///
/// Use [`ScreenRecorder::builder()`] to create one.
///
/// # Example
///
/// ```no_run
/// use screen_recorder::{FileContainerFactory, MockCaptureSource, ScreenRecorder};
///
/// # async fn demo() {
/// let recorder = ScreenRecorder::builder(MockCaptureSource::new())
///     .writer(FileContainerFactory)
///     .output_dir(std::env::temp_dir().join("captures"))
///     .on_event(|e| tracing::info!(?e, "recorder event"))
///     .build();
/// # }
/// ```
#[must_use]
pub struct ScreenRecorderBuilder {
    source: Arc<dyn CaptureSource>,
    factory: Arc<dyn WriterFactory>,
    config: RecorderConfig,
    event_callback: Option<EventCallback>,
}

impl ScreenRecorderBuilder {
    /// Creates a builder with default settings and the file container writer.
    pub fn new<S: CaptureSource + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
            factory: Arc::new(FileContainerFactory),
            config: RecorderConfig::default(),
            event_callback: None,
        }
    }

    /// Sets the writer factory used for each recording.
    pub fn writer<W: WriterFactory + 'static>(mut self, factory: W) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Sets the directory recordings are written to.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Sets a callback for runtime events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(RecorderEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Sets the recorder configuration.
    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawns the recorder task and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> ScreenRecorder {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let state = Arc::new(StateCell::new());

        tracing::debug!(
            source = self.source.name(),
            writer = self.factory.name(),
            output_dir = %self.config.output_dir.display(),
            "Building screen recorder"
        );

        RecorderStateMachine::spawn(
            Arc::clone(&self.source),
            self.factory,
            self.config,
            Arc::clone(&state),
            self.event_callback,
            command_rx,
        );

        ScreenRecorder::new(command_tx, state, self.source)
    }
}
