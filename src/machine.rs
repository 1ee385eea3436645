//! The recorder task.
//!
//! Every state transition happens here, on one tokio task. Callers send
//! [`Command`]s; the capture source reports back through [`Inbound`] events
//! and the bounded sample queue. Because the task handles one message at a
//! time, no two transitions can interleave: a cancel that arrives while a
//! stop is finalizing runs after finalization and finds the recorder idle.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::RecorderConfig;
use crate::event::{EventCallback, RecorderEvent};
use crate::pipeline::RouteOutcome;
use crate::session::{RecordingSession, RecordingSummary, Reply, SessionId, StartOptions};
use crate::source::{CaptureConfig, CaptureSource, SampleSender};
use crate::state::{RecorderState, StateCell};
use crate::writer::{WriterFactory, WriterHandle};
use crate::{CaptureError, MediaSample, RecorderError};

/// Requests from [`ScreenRecorder`](crate::ScreenRecorder) handles.
pub(crate) enum Command {
    Start {
        options: StartOptions,
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<RecordingSummary>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Notifications from the capture source, tagged with their recording.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// `start_capture` succeeded.
    CaptureStarted { session: SessionId },
    /// `start_capture` failed or timed out.
    CaptureStartFailed {
        session: SessionId,
        error: CaptureError,
    },
    /// `stop_capture` finished.
    CaptureStopped {
        session: SessionId,
        result: Result<(), CaptureError>,
    },
    /// The running stream failed.
    CaptureFailed {
        session: SessionId,
        error: CaptureError,
    },
}

/// Why a recording is being thrown away.
enum Teardown {
    /// A request failed with this error.
    Failed(RecorderError),
    /// The capture stream died while recording.
    CaptureLost(CaptureError),
    /// `cancel` or shutdown.
    Cancelled,
}

impl Teardown {
    fn start_error(&self) -> RecorderError {
        match self {
            Self::Failed(err @ RecorderError::StartFailed { .. }) => err.clone(),
            Self::Failed(err) => RecorderError::start_failed(err.to_string()),
            Self::CaptureLost(err) => RecorderError::start_failed(err.to_string()),
            Self::Cancelled => RecorderError::Cancelled,
        }
    }

    fn stop_error(&self) -> RecorderError {
        match self {
            Self::Failed(err) => err.clone(),
            Self::CaptureLost(err) => RecorderError::stop_failed(err.to_string()),
            Self::Cancelled => RecorderError::Cancelled,
        }
    }

    fn reason(&self) -> String {
        match self {
            Self::Failed(err) => err.to_string(),
            Self::CaptureLost(err) => format!("capture failed: {err}"),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

/// Owns the active recording and serializes every transition.
pub(crate) struct RecorderStateMachine {
    source: Arc<dyn CaptureSource>,
    factory: Arc<dyn WriterFactory>,
    config: RecorderConfig,
    state: Arc<StateCell>,
    event_callback: Option<EventCallback>,
    session: Option<RecordingSession>,
    last_session: u64,
    samples_tx: mpsc::Sender<(SessionId, MediaSample)>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
}

impl RecorderStateMachine {
    /// Spawns the recorder task. It runs until every command sender is
    /// dropped or a shutdown command arrives.
    pub fn spawn(
        source: Arc<dyn CaptureSource>,
        factory: Arc<dyn WriterFactory>,
        config: RecorderConfig,
        state: Arc<StateCell>,
        event_callback: Option<EventCallback>,
        commands: mpsc::Receiver<Command>,
    ) -> JoinHandle<()> {
        let (samples_tx, samples_rx) = mpsc::channel(config.sample_queue_capacity.max(1));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let machine = Self {
            source,
            factory,
            config,
            state,
            event_callback,
            session: None,
            last_session: 0,
            samples_tx,
            inbound_tx,
        };
        tokio::spawn(machine.run(commands, inbound_rx, samples_rx))
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut inbound: mpsc::UnboundedReceiver<Inbound>,
        mut samples: mpsc::Receiver<(SessionId, MediaSample)>,
    ) {
        tracing::debug!(
            source = self.source.name(),
            writer = self.factory.name(),
            "Recorder task started"
        );

        let done = loop {
            tokio::select! {
                biased;

                Some(event) = inbound.recv() => self.on_inbound(event).await,

                command = commands.recv() => match command {
                    Some(Command::Start { options, reply }) => self.start(options, reply).await,
                    Some(Command::Stop { reply }) => self.stop(reply, &mut samples).await,
                    Some(Command::Cancel { reply }) => {
                        let cancelled = self.cancel().await;
                        let _ = reply.send(cancelled);
                    }
                    Some(Command::Shutdown { done }) => break Some(done),
                    None => break None,
                },

                Some((session, sample)) = samples.recv() => self.on_sample(session, sample),
            }
        };
        commands.close();

        if self.session.is_some() {
            tracing::info!("Recorder shutting down, cancelling active recording");
            self.cancel().await;
        }
        tracing::debug!("Recorder task stopped");

        if let Some(done) = done {
            let _ = done.send(());
        }
    }

    async fn on_inbound(&mut self, event: Inbound) {
        match event {
            Inbound::CaptureStarted { session } => self.on_capture_started(session).await,
            Inbound::CaptureStartFailed { session, error } => {
                self.on_capture_start_failed(session, error).await;
            }
            Inbound::CaptureStopped { session, result } => {
                self.on_capture_stopped(session, result).await;
            }
            Inbound::CaptureFailed { session, error } => {
                self.on_capture_failed(session, error).await;
            }
        }
    }

    /// Returns the active recording if it is `id`.
    fn current(&mut self, id: SessionId) -> Option<&mut RecordingSession> {
        self.session.as_mut().filter(|session| session.id == id)
    }

    async fn start(&mut self, options: StartOptions, reply: Reply<()>) {
        if self.session.is_some() {
            let _ = reply.send(Err(RecorderError::Busy));
            return;
        }
        if !self.source.is_available() {
            tracing::warn!(source = self.source.name(), "Capture source unavailable");
            let _ = reply.send(Err(RecorderError::Unavailable));
            return;
        }

        let display = self.source.display();
        let writer = match WriterHandle::prepare(
            Arc::clone(&self.factory),
            &self.config,
            &options,
            display,
        )
        .await
        {
            Ok(writer) => writer,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to prepare writer");
                let _ = reply.send(Err(e));
                return;
            }
        };

        self.last_session += 1;
        let id = SessionId::new(self.last_session);
        tracing::info!(
            session = %id,
            path = %writer.path().display(),
            tracks = writer.tracks().len(),
            mic = options.mic,
            app_audio = options.app_audio,
            "Recording started"
        );
        self.session = Some(RecordingSession::new(id, writer, now_ms(), reply));
        self.transition(RecorderState::Recording);

        let capture = CaptureConfig {
            microphone: options.mic,
            app_audio: options.app_audio,
            frame_rate: options.fps,
        };
        let sender = SampleSender::new(id, self.samples_tx.clone(), self.inbound_tx.clone());
        let source = Arc::clone(&self.source);
        let events = self.inbound_tx.clone();
        let timeout = self.config.capture_timeout;

        tokio::spawn(async move {
            let result = within(timeout, "start", source.start_capture(capture, sender)).await;
            let event = match result {
                Ok(()) => Inbound::CaptureStarted { session: id },
                Err(error) => Inbound::CaptureStartFailed { session: id, error },
            };
            let _ = events.send(event);
        });
    }

    fn on_sample(&mut self, id: SessionId, sample: MediaSample) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.id != id || session.stop_requested {
            tracing::trace!(session = %id, track = %sample.kind, "Sample outside recording dropped");
            return;
        }
        if !sample.is_data_ready() {
            tracing::trace!(session = %id, track = %sample.kind, "Sample not ready, dropped");
            return;
        }
        let Some(writer) = session.writer.as_mut() else {
            return;
        };

        let (origin, first) = session.clock.observe(sample.timestamp, writer);
        if session.router.route(writer, &sample) == RouteOutcome::Appended {
            session.samples_written += 1;
        }

        if first {
            tracing::debug!(session = %id, %origin, "Session origin set");
            self.emit(RecorderEvent::OriginSet {
                session: id,
                origin,
            });
        }
    }

    async fn stop(
        &mut self,
        reply: Reply<RecordingSummary>,
        samples: &mut mpsc::Receiver<(SessionId, MediaSample)>,
    ) {
        if !self.session.as_ref().is_some_and(|s| !s.stop_requested) {
            let _ = reply.send(Err(RecorderError::NotRunning));
            return;
        }

        // Samples queued before the stop request still belong to the recording.
        while let Ok((id, sample)) = samples.try_recv() {
            self.on_sample(id, sample);
        }

        let Some(session) = self.session.as_mut() else {
            let _ = reply.send(Err(RecorderError::NotRunning));
            return;
        };
        let id = session.id;
        session.stop_requested = true;
        session.ended_at_ms = Some(now_ms());
        session.pending_stop = Some(reply);
        self.transition(RecorderState::Stopping);

        tracing::debug!(session = %id, "Stopping capture");
        let source = Arc::clone(&self.source);
        let events = self.inbound_tx.clone();
        let timeout = self.config.capture_timeout;
        tokio::spawn(async move {
            let result = within(timeout, "stop", source.stop_capture()).await;
            let _ = events.send(Inbound::CaptureStopped {
                session: id,
                result,
            });
        });
    }

    async fn on_capture_started(&mut self, id: SessionId) {
        let Some(session) = self.current(id) else {
            self.release_orphaned_capture(id).await;
            return;
        };
        if let Some(reply) = session.pending_start.take() {
            let _ = reply.send(Ok(()));
        }
        tracing::debug!(session = %id, "Capture started");
        self.emit(RecorderEvent::CaptureStarted { session: id });
    }

    /// Stops a capture whose start completed after its recording ended.
    ///
    /// A newer recording owns the source once it exists; its capture is left
    /// alone.
    async fn release_orphaned_capture(&mut self, id: SessionId) {
        if self.session.is_some() {
            tracing::warn!(session = %id, "Late capture start while another recording is active");
            return;
        }

        tracing::debug!(session = %id, "Stopping capture started after its recording ended");
        if let Err(error) =
            within(self.config.capture_timeout, "stop", self.source.stop_capture()).await
        {
            tracing::debug!(session = %id, %error, "Failed to stop orphaned capture");
        }
    }

    async fn on_capture_start_failed(&mut self, id: SessionId, error: CaptureError) {
        let Some(session) = self.current(id) else {
            tracing::debug!(session = %id, %error, "Ignoring start failure of a finished recording");
            return;
        };

        if session.stop_requested {
            // The stop already in flight decides what happens to the file.
            if let Some(reply) = session.pending_start.take() {
                let _ = reply.send(Err(RecorderError::start_failed(error.to_string())));
            }
            tracing::debug!(session = %id, %error, "Capture start failed while stopping");
            return;
        }

        tracing::warn!(session = %id, %error, "Capture source failed to start");
        self.discard_session(Teardown::Failed(RecorderError::start_failed(
            error.to_string(),
        )))
        .await;
    }

    async fn on_capture_failed(&mut self, id: SessionId, error: CaptureError) {
        let Some(session) = self.current(id) else {
            tracing::debug!(session = %id, %error, "Ignoring capture failure of a finished recording");
            return;
        };
        let stopping = session.stop_requested;

        self.emit(RecorderEvent::CaptureFailed {
            session: id,
            error: error.to_string(),
        });

        if stopping {
            tracing::debug!(session = %id, %error, "Capture failed while stopping, stop proceeds");
            return;
        }

        tracing::warn!(session = %id, %error, "Capture failed, discarding recording");
        self.discard_session(Teardown::CaptureLost(error)).await;
    }

    async fn on_capture_stopped(&mut self, id: SessionId, result: Result<(), CaptureError>) {
        let Some(session) = self.current(id) else {
            tracing::debug!(session = %id, "Ignoring capture stop of a finished recording");
            return;
        };

        if let Err(error) = result {
            tracing::warn!(session = %id, %error, "Capture source failed to stop");
            self.discard_session(Teardown::Failed(RecorderError::stop_failed(
                error.to_string(),
            )))
            .await;
            return;
        }

        let Some(writer) = session.writer.take() else {
            tracing::warn!(session = %id, "No writer left to finalize");
            self.discard_session(Teardown::Failed(RecorderError::MissingWriter))
                .await;
            return;
        };

        match writer.finalize().await {
            Ok(path) => self.complete_session(path),
            Err(e) => self.discard_session(Teardown::Failed(e)).await,
        }
    }

    /// Ends the active recording successfully, keeping its file.
    fn complete_session(&mut self, path: PathBuf) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let ended_at_ms = session.ended_at_ms.unwrap_or_else(now_ms);
        let summary = RecordingSummary::new(path, session.started_at_ms, ended_at_ms);

        self.transition(RecorderState::Idle);
        tracing::info!(
            session = %session.id,
            path = %summary.path.display(),
            duration_seconds = summary.duration_seconds,
            samples = session.samples_written,
            "Recording saved"
        );
        self.emit(RecorderEvent::RecordingSaved {
            session: session.id,
            path: summary.path.clone(),
            duration_seconds: summary.duration_seconds,
        });

        if let Some(reply) = session.pending_start.take() {
            let _ = reply.send(Err(RecorderError::start_failed(
                "recording stopped before capture start completed",
            )));
        }
        if let Some(reply) = session.pending_stop.take() {
            let _ = reply.send(Ok(summary));
        }
    }

    async fn cancel(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let id = session.id;
        let stop_in_flight = session.stop_requested;
        session.stop_requested = true;
        self.transition(RecorderState::Stopping);

        if stop_in_flight {
            tracing::debug!(session = %id, "Stop already in flight, cancelling without a second stop");
        } else if let Err(error) =
            within(self.config.capture_timeout, "stop", self.source.stop_capture()).await
        {
            tracing::debug!(session = %id, %error, "Ignoring capture stop failure during cancel");
        }

        self.discard_session(Teardown::Cancelled).await;
        true
    }

    /// Throws the active recording away: deletes its file, answers every
    /// waiting caller and returns to idle.
    async fn discard_session(&mut self, teardown: Teardown) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Some(writer) = session.writer.take() {
            writer.discard().await;
        }
        self.transition(RecorderState::Idle);

        let reason = teardown.reason();
        tracing::info!(session = %session.id, %reason, "Recording discarded");
        self.emit(RecorderEvent::RecordingDiscarded {
            session: session.id,
            reason,
        });

        if let Some(reply) = session.pending_start.take() {
            let _ = reply.send(Err(teardown.start_error()));
        }
        if let Some(reply) = session.pending_stop.take() {
            let _ = reply.send(Err(teardown.stop_error()));
        }
    }

    fn transition(&self, next: RecorderState) {
        let previous = self.state.set(next);
        if previous != next {
            tracing::debug!(%previous, current = %next, "State changed");
            self.emit(RecorderEvent::StateChanged {
                previous,
                current: next,
            });
        }
    }

    fn emit(&self, event: RecorderEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

/// Runs a capture source call, failing with `TimedOut` after `timeout`.
async fn within<F>(timeout: Duration, operation: &'static str, call: F) -> Result<(), CaptureError>
where
    F: Future<Output = Result<(), CaptureError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(CaptureError::TimedOut { operation }))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
