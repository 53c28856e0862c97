use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;

use capture_application::{
    FlowMode, LocationProbe, LocationProbeImpl, SubmitBatchRequest, SubmitBatchUseCase,
    SubmitBatchUseCaseImpl, VoiceNoteSession,
};
use capture_configuration::AppConfig;
use capture_domain::{
    AuthPort, AuthenticatedUser, CaptureQueue, LocationFix, MediaPickerPort, QuotaGate, QuotaPort,
};
use capture_infra_local::{
    FsMediaLibrary, LocalPlayback, LocalRecorder, StaticAuthContext, StaticLocationSource,
    StaticPermissions,
};
use capture_infra_transcribe_rest::RestTranscriptionAdapter;
use capture_infra_upload_rest::{HttpConnectivityProbe, RestQuotaSource, RestUploadSink};

pub async fn build_and_run(config: AppConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run().await
}

pub struct Application {
    pub config: AppConfig,
    pub location_probe: Arc<dyn LocationProbe>,
    pub voice: VoiceNoteSession,
    pub picker: Arc<dyn MediaPickerPort>,
    pub quota: Arc<dyn QuotaPort>,
    pub submitter: Arc<dyn SubmitBatchUseCase>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        tracing::info!(
            store = %config.upload.base_url,
            max_items = config.capture.max_items,
            library = %config.media.library_dir,
            "initializing capture application"
        );

        let auth: Arc<dyn AuthPort> = Arc::new(StaticAuthContext::new(
            config.auth.bearer_token.clone(),
            configured_user(&config),
        ));
        let permissions = Arc::new(StaticPermissions::allow_all());
        let location_source = Arc::new(StaticLocationSource::new(configured_fix(&config)));
        let location_probe: Arc<dyn LocationProbe> = Arc::new(LocationProbeImpl::new(
            Arc::clone(&permissions) as _,
            location_source,
            Duration::from_millis(config.location.fresh_fix_timeout_ms),
        ));

        let picker: Arc<dyn MediaPickerPort> = Arc::new(FsMediaLibrary::new(
            config.media.library_dir.clone(),
            config.media.scratch_dir.clone(),
        ));

        let voice = VoiceNoteSession::with_tick_interval(
            permissions,
            Arc::new(LocalRecorder::new(config.media.scratch_dir.clone())),
            Arc::new(LocalPlayback),
            Arc::new(RestTranscriptionAdapter::new(
                config.transcription.base_url.clone(),
                Duration::from_millis(config.transcription.request_timeout_ms),
                config.transcription.language.clone(),
            )),
            Duration::from_millis(config.capture.recorder_tick_ms),
        );

        let request_timeout = Duration::from_millis(config.upload.request_timeout_ms);
        let sink = Arc::new(RestUploadSink::new(
            config.upload.base_url.clone(),
            request_timeout,
            config.auth.bearer_token.clone(),
        ));
        let quota: Arc<dyn QuotaPort> = Arc::new(RestQuotaSource::new(
            config.upload.base_url.clone(),
            request_timeout,
            config.auth.bearer_token.clone(),
        ));
        let connectivity = Arc::new(HttpConnectivityProbe::new(
            config.upload.base_url.clone(),
            Duration::from_millis(config.upload.probe_timeout_ms),
        ));

        let submitter: Arc<dyn SubmitBatchUseCase> = Arc::new(SubmitBatchUseCaseImpl::new(
            sink,
            connectivity,
            Arc::clone(&quota),
            auth,
            Arc::clone(&picker),
        ));

        Ok(Self {
            config,
            location_probe,
            voice,
            picker,
            quota,
            submitter,
        })
    }

    /// One headless capture pass; remote failures degrade instead of aborting.
    pub async fn run(self) -> Result<(), Error> {
        let mut queue = CaptureQueue::new(self.config.capture.max_items);

        let location = self.location_probe.acquire().await;
        tracing::info!(has_fix = location.is_some(), "session location resolved");

        match self.quota.usage_snapshot().await {
            Ok(usage) => tracing::info!(
                used_units = usage.used_units,
                quota_units = usage.quota_units,
                allowed = QuotaGate::allows(&usage),
                "storage usage at session start"
            ),
            Err(err) => tracing::warn!(error = %err, "storage usage unavailable at session start"),
        }

        let picked = self.picker.pick_from_library(queue.max_items()).await?;
        let selection = queue.select(picked);
        tracing::info!(
            accepted = selection.accepted,
            truncated = selection.truncated,
            "media staged from the library"
        );
        if queue.is_empty() {
            tracing::info!("media library is empty; capturing a camera frame instead");
            match self.picker.capture_from_camera().await {
                Ok(item) => {
                    queue.select(vec![item]);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "camera capture unavailable; nothing to submit");
                    return Ok(());
                }
            }
        }

        match self.voice.start_recording().await {
            Ok(()) => {
                let two_and_a_half_ticks =
                    Duration::from_millis(self.config.capture.recorder_tick_ms * 5 / 2);
                tokio::time::sleep(two_and_a_half_ticks).await;
                self.voice.stop_recording().await?;
                if let Err(err) = self.voice.transcribe().await {
                    tracing::warn!(error = %err, "transcription unavailable; submitting the note without text");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "voice note unavailable for this session");
            }
        }

        let request = SubmitBatchRequest {
            title: "smoke session".to_string(),
            description: "headless capture smoke run".to_string(),
            severity_level: 1,
            anomaly_type: "smoke".to_string(),
            anomaly_category: "diagnostics".to_string(),
            location,
            flow: FlowMode::Exit,
        };
        match self
            .submitter
            .submit(request, &mut queue, &self.voice)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    device_session_id = %response.device_session_id,
                    succeeded = response.report.succeeded_count,
                    failed = response.report.failed_count,
                    "batch submitted"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "batch submission aborted");
            }
        }

        self.voice.force_stop_and_cleanup().await;
        Ok(())
    }
}

fn configured_user(config: &AppConfig) -> Option<AuthenticatedUser> {
    config.auth.user_id.as_ref().map(|id| AuthenticatedUser {
        id: id.clone(),
        email: config.auth.user_email.clone(),
        first_name: config.auth.user_first_name.clone(),
        last_name: config.auth.user_last_name.clone(),
    })
}

fn configured_fix(config: &AppConfig) -> Option<LocationFix> {
    match (config.location.fixed_latitude, config.location.fixed_longitude) {
        (Some(latitude), Some(longitude)) => Some(LocationFix {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..LocationFix::default()
        }),
        _ => None,
    }
}
