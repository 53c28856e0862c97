use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use capture_domain::{ActivePlayback, ActiveRecording, DomainError, PlaybackPort, RecorderPort};

const SAMPLE_RATE_HZ: u32 = 16_000;
const MAX_CLIP_SECONDS: f64 = 30.0;

/// Simulated microphone: times the capture and writes a silent mono wav on
/// finish. The in-process lock is the exclusive audio input.
pub struct LocalRecorder {
    scratch_dir: PathBuf,
    microphone: Arc<Mutex<()>>,
}

impl LocalRecorder {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            microphone: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl RecorderPort for LocalRecorder {
    async fn start(&self) -> Result<Box<dyn ActiveRecording>, DomainError> {
        let microphone = Arc::clone(&self.microphone)
            .try_lock_owned()
            .map_err(|_| DomainError::internal_error("the microphone is already in use"))?;
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|err| {
                DomainError::internal_error(&format!(
                    "could not create scratch dir `{}`: {err}",
                    self.scratch_dir.display()
                ))
            })?;
        let path = self.scratch_dir.join(format!("note-{}.wav", Uuid::new_v4()));
        tracing::debug!(path = %path.display(), "local recording started");
        Ok(Box::new(LocalActiveRecording {
            _microphone: microphone,
            path,
            started: Instant::now(),
        }))
    }
}

struct LocalActiveRecording {
    _microphone: OwnedMutexGuard<()>,
    path: PathBuf,
    started: Instant,
}

#[async_trait]
impl ActiveRecording for LocalActiveRecording {
    async fn finish(self: Box<Self>) -> Result<Option<String>, DomainError> {
        let elapsed = self.started.elapsed().as_secs_f64().min(MAX_CLIP_SECONDS);
        let sample_count = (elapsed * f64::from(SAMPLE_RATE_HZ)).max(1.0) as usize;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE_HZ,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let written = (|| -> Result<(), hound::Error> {
            let mut writer = hound::WavWriter::create(&self.path, spec)?;
            for _ in 0..sample_count {
                writer.write_sample(0_i16)?;
            }
            writer.finalize()
        })();

        match written {
            Ok(()) => Ok(Some(self.path.to_string_lossy().into_owned())),
            Err(err) => {
                tracing::warn!(error = %err, "local recorder could not write the clip");
                Ok(None)
            }
        }
    }
}

/// No audio device; the handle just waits out the clip's duration.
pub struct LocalPlayback;

#[async_trait]
impl PlaybackPort for LocalPlayback {
    async fn play(&self, uri: &str) -> Result<Box<dyn ActivePlayback>, DomainError> {
        let reader = hound::WavReader::open(uri).map_err(|err| {
            DomainError::internal_error(&format!("could not open clip `{uri}`: {err}"))
        })?;
        let spec = reader.spec();
        let seconds = f64::from(reader.duration()) / f64::from(spec.sample_rate.max(1));
        tracing::debug!(%uri, seconds, "local playback started");
        Ok(Box::new(LocalActivePlayback {
            started: Instant::now(),
            clip: Duration::from_secs_f64(seconds),
        }))
    }
}

struct LocalActivePlayback {
    started: Instant,
    clip: Duration,
}

impl ActivePlayback for LocalActivePlayback {
    fn is_finished(&self) -> bool {
        self.started.elapsed() >= self.clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finish_writes_a_wav_and_releases_the_microphone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let recorder = LocalRecorder::new(dir.path());

        let handle = recorder.start().await.expect("start should succeed");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let uri = handle
            .finish()
            .await
            .expect("finish should succeed")
            .expect("a clip should be produced");

        assert!(uri.ends_with(".wav"));
        assert!(std::path::Path::new(&uri).exists());

        // The microphone must be free again.
        let second = recorder.start().await.expect("restart should succeed");
        drop(second);
    }

    #[tokio::test]
    async fn concurrent_start_is_refused_while_a_capture_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let recorder = LocalRecorder::new(dir.path());

        let first = recorder.start().await.expect("start should succeed");
        assert!(recorder.start().await.is_err());

        drop(first);
        let reopened = recorder.start().await;
        assert!(reopened.is_ok(), "dropping the handle must release the microphone");
    }

    #[tokio::test]
    async fn playback_finishes_after_the_clip_duration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let recorder = LocalRecorder::new(dir.path());
        let handle = recorder.start().await.expect("start should succeed");
        tokio::time::sleep(Duration::from_millis(40)).await;
        let uri = handle
            .finish()
            .await
            .expect("finish should succeed")
            .expect("a clip should be produced");

        let player = LocalPlayback;
        let playing = player.play(&uri).await.expect("play should succeed");
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(playing.is_finished());
    }

    #[tokio::test]
    async fn playback_of_a_missing_clip_fails() {
        let player = LocalPlayback;
        assert!(player.play("/nonexistent/clip.wav").await.is_err());
    }
}
