use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use capture_domain::{
    ActivePlayback, ActiveRecording, Capability, DomainError, PermissionStatus, PermissionsPort,
    PlaybackPort, RecorderPort, RecordingState, TranscriptionPort, VoiceNote,
};

use crate::error::ApplicationError;

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceNoteSnapshot {
    pub state: RecordingState,
    pub uri: Option<String>,
    pub duration_seconds: u64,
    pub transcript: Option<String>,
    pub transcribing: bool,
}

#[derive(Default)]
struct VoiceNoteState {
    phase: RecordingState,
    uri: Option<String>,
    duration_seconds: u64,
    transcript: Option<String>,
    transcribing: bool,
    recording: Option<Box<dyn ActiveRecording>>,
    playback: Option<Box<dyn ActivePlayback>>,
    ticker: Option<JoinHandle<()>>,
}

impl VoiceNoteState {
    // Playback ends on its own; settle back to Recorded when next observed.
    fn reconcile_playback(&mut self) {
        if self.phase != RecordingState::Playing {
            return;
        }
        let finished = self
            .playback
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true);
        if finished {
            self.playback = None;
            self.phase = RecordingState::Recorded;
        }
    }

    fn snapshot(&self) -> VoiceNoteSnapshot {
        VoiceNoteSnapshot {
            state: self.phase,
            uri: self.uri.clone(),
            duration_seconds: self.duration_seconds,
            transcript: self.transcript.clone(),
            transcribing: self.transcribing,
        }
    }
}

/// Recorder and playback handles live inside the state; dropping them is
/// what releases the audio resources.
#[derive(Clone)]
pub struct VoiceNoteSession {
    permissions: Arc<dyn PermissionsPort>,
    recorder: Arc<dyn RecorderPort>,
    playback: Arc<dyn PlaybackPort>,
    transcription: Arc<dyn TranscriptionPort>,
    state: Arc<Mutex<VoiceNoteState>>,
    tick_interval: Duration,
}

impl VoiceNoteSession {
    pub fn new(
        permissions: Arc<dyn PermissionsPort>,
        recorder: Arc<dyn RecorderPort>,
        playback: Arc<dyn PlaybackPort>,
        transcription: Arc<dyn TranscriptionPort>,
    ) -> Self {
        Self::with_tick_interval(
            permissions,
            recorder,
            playback,
            transcription,
            Duration::from_secs(1),
        )
    }

    pub fn with_tick_interval(
        permissions: Arc<dyn PermissionsPort>,
        recorder: Arc<dyn RecorderPort>,
        playback: Arc<dyn PlaybackPort>,
        transcription: Arc<dyn TranscriptionPort>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            permissions,
            recorder,
            playback,
            transcription,
            state: Arc::new(Mutex::new(VoiceNoteState::default())),
            tick_interval,
        }
    }

    pub async fn start_recording(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock().await;
        state.reconcile_playback();
        if state.phase != RecordingState::Idle {
            return Err(DomainError::invalid_transition(&format!(
                "cannot start recording from {:?}",
                state.phase
            ))
            .into());
        }

        match self.permissions.request(Capability::Microphone).await? {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => {
                tracing::debug!("microphone permission denied; recording not started");
                return Err(
                    DomainError::permission_denied(Capability::Microphone.as_str()).into(),
                );
            }
        }

        let handle = self.recorder.start().await?;
        state.recording = Some(handle);
        state.phase = RecordingState::Recording;
        state.uri = None;
        state.transcript = None;
        state.duration_seconds = 0;
        state.ticker = Some(self.spawn_ticker());
        tracing::debug!("voice recording started");
        Ok(())
    }

    pub async fn stop_recording(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock().await;
        if state.phase != RecordingState::Recording {
            return Err(DomainError::invalid_transition(
                "stop is only valid while a recording is running",
            )
            .into());
        }
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        let handle = state.recording.take().ok_or_else(|| {
            DomainError::internal_error("recording phase without an active handle")
        })?;

        match handle.finish().await {
            Ok(Some(uri)) => {
                tracing::debug!(duration_seconds = state.duration_seconds, %uri, "voice recording stopped");
                state.uri = Some(uri);
                state.phase = RecordingState::Recorded;
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("recorder produced no file; voice note discarded");
                state.phase = RecordingState::Idle;
                state.duration_seconds = 0;
                Ok(())
            }
            Err(err) => {
                state.phase = RecordingState::Idle;
                state.duration_seconds = 0;
                Err(err.into())
            }
        }
    }

    pub async fn toggle_playback(&self) -> Result<RecordingState, ApplicationError> {
        let mut state = self.state.lock().await;
        state.reconcile_playback();
        match state.phase {
            RecordingState::Recorded => {
                let uri = state.uri.clone().ok_or_else(|| {
                    DomainError::internal_error("recorded phase without a clip uri")
                })?;
                let handle = self.playback.play(&uri).await?;
                state.playback = Some(handle);
                state.phase = RecordingState::Playing;
            }
            RecordingState::Playing => {
                state.playback = None;
                state.phase = RecordingState::Recorded;
            }
            other => {
                return Err(DomainError::invalid_transition(&format!(
                    "playback is not valid from {other:?}"
                ))
                .into());
            }
        }
        Ok(state.phase)
    }

    pub async fn delete(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock().await;
        state.reconcile_playback();
        if state.phase != RecordingState::Recorded {
            return Err(DomainError::invalid_transition(
                "delete is only valid for a recorded note",
            )
            .into());
        }
        state.uri = None;
        state.transcript = None;
        state.duration_seconds = 0;
        state.transcribing = false;
        state.phase = RecordingState::Idle;
        tracing::debug!("voice note deleted");
        Ok(())
    }

    /// Runs without holding the session lock; the transcript is kept only if
    /// the same clip is still present when the result lands.
    pub async fn transcribe(&self) -> Result<String, ApplicationError> {
        let uri = {
            let mut state = self.state.lock().await;
            state.reconcile_playback();
            if state.phase != RecordingState::Recorded {
                return Err(DomainError::invalid_transition(
                    "transcription requires a recorded note",
                )
                .into());
            }
            if state.transcribing {
                return Err(ApplicationError::Validation(
                    "a transcription is already running".to_string(),
                ));
            }
            let uri = state.uri.clone().ok_or_else(|| {
                DomainError::internal_error("recorded phase without a clip uri")
            })?;
            state.transcribing = true;
            uri
        };

        let result = self.transcription.transcribe(&uri).await;

        let mut state = self.state.lock().await;
        let still_current = state.uri.as_deref() == Some(uri.as_str());
        if still_current {
            state.transcribing = false;
        }
        match result {
            Ok(text) => {
                if still_current {
                    state.transcript = Some(text.clone());
                    tracing::debug!(chars = text.len(), "voice note transcribed");
                } else {
                    tracing::debug!("transcript discarded; the voice note changed while transcribing");
                }
                Ok(text)
            }
            Err(err) => {
                tracing::warn!(error = %err, "voice note transcription failed");
                Err(err.into())
            }
        }
    }

    pub async fn snapshot(&self) -> VoiceNoteSnapshot {
        let mut state = self.state.lock().await;
        state.reconcile_playback();
        state.snapshot()
    }

    pub async fn state(&self) -> RecordingState {
        self.snapshot().await.state
    }

    /// Stops an in-progress recording first; a failed stop just means
    /// submitting without a note.
    pub async fn finalize(&self) -> Option<VoiceNote> {
        let recording = { self.state.lock().await.phase == RecordingState::Recording };
        if recording {
            if let Err(err) = self.stop_recording().await {
                tracing::warn!(error = %err, "stopping the in-progress recording failed; submitting without a voice note");
            }
        }
        let mut state = self.state.lock().await;
        state.reconcile_playback();
        state.uri.clone().map(|uri| VoiceNote {
            uri,
            duration_seconds: state.duration_seconds,
            transcript: state.transcript.clone(),
        })
    }

    pub async fn force_stop_and_cleanup(&self) {
        let mut state = self.state.lock().await;
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        if state.phase != RecordingState::Idle {
            tracing::debug!(phase = ?state.phase, "voice note session force-stopped");
        }
        *state = VoiceNoteState::default();
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.tick_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut state = state.lock().await;
                if state.phase != RecordingState::Recording {
                    break;
                }
                state.duration_seconds += 1;
            }
        })
    }
}
