use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use validator::Validate;

use capture_domain::{
    AuthPort, BatchReport, CaptureQueue, ConnectivityPort, ConnectivityStatus, ItemOutcome,
    MediaPickerPort, QuotaGate, QuotaPort, SubmissionOutcome, UploadMetadata, UploadSinkPort,
};

use crate::author::resolve_author;
use crate::dto::{FlowMode, FlowSignal, SubmitBatchRequest, SubmitBatchResponse};
use crate::error::ApplicationError;
use crate::voicenote::VoiceNoteSession;

#[async_trait]
pub trait SubmitBatchUseCase: Send + Sync {
    async fn submit(
        &self,
        request: SubmitBatchRequest,
        queue: &mut CaptureQueue,
        voice: &VoiceNoteSession,
    ) -> Result<SubmitBatchResponse, ApplicationError>;
}

pub struct SubmitBatchUseCaseImpl {
    sink: Arc<dyn UploadSinkPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    quota: Arc<dyn QuotaPort>,
    auth: Arc<dyn AuthPort>,
    picker: Arc<dyn MediaPickerPort>,
}

impl SubmitBatchUseCaseImpl {
    pub fn new(
        sink: Arc<dyn UploadSinkPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        quota: Arc<dyn QuotaPort>,
        auth: Arc<dyn AuthPort>,
        picker: Arc<dyn MediaPickerPort>,
    ) -> Self {
        Self {
            sink,
            connectivity,
            quota,
            auth,
            picker,
        }
    }

    /// Admission checks; a rejected batch leaves the sink untouched.
    async fn check_preconditions(&self, queue: &CaptureQueue) -> Result<(), ApplicationError> {
        if queue.is_empty() {
            return Err(ApplicationError::NoItemsSelected);
        }
        if self.connectivity.status().await == ConnectivityStatus::Offline {
            return Err(ApplicationError::ConnectivityRequired);
        }
        match self.quota.usage_snapshot().await {
            Ok(usage) if !QuotaGate::allows(&usage) => Err(ApplicationError::QuotaExceeded {
                used_units: usage.used_units,
                quota_units: usage.quota_units,
            }),
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "storage usage unavailable; submitting without the quota check");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SubmitBatchUseCase for SubmitBatchUseCaseImpl {
    async fn submit(
        &self,
        request: SubmitBatchRequest,
        queue: &mut CaptureQueue,
        voice: &VoiceNoteSession,
    ) -> Result<SubmitBatchResponse, ApplicationError> {
        request
            .validate()
            .map_err(|err| ApplicationError::Validation(err.to_string()))?;
        self.check_preconditions(queue).await?;

        let voice_note = voice.finalize().await;
        let author = resolve_author(self.auth.as_ref()).await;
        let device_session_id = Uuid::new_v4().to_string();

        let metadata = UploadMetadata {
            title: request.title,
            description: request.description,
            severity_level: request.severity_level,
            anomaly_type: request.anomaly_type,
            anomaly_category: request.anomaly_category,
            author_name: author.name,
            author_id: author.id,
            device_session_id: device_session_id.clone(),
            location: request.location,
            voice_note,
        };

        let items = queue.items().to_vec();
        tracing::info!(
            item_count = items.len(),
            device_session_id = %device_session_id,
            has_voice_note = metadata.voice_note.is_some(),
            "starting batch submission"
        );

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let is_last = index + 1 == items.len();
            let outcome = match self.sink.create(item, &metadata, !is_last).await {
                Ok(record) => {
                    tracing::debug!(item_index = index, remote_id = %record.id, "item uploaded");
                    SubmissionOutcome::Succeeded
                }
                Err(err) => {
                    tracing::warn!(item_index = index, error = %err, "item upload failed");
                    SubmissionOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(ItemOutcome {
                item_index: index,
                outcome,
            });
        }

        let report = BatchReport::from_outcomes(outcomes);
        tracing::info!(
            succeeded = report.succeeded_count,
            failed = report.failed_count,
            "batch submission completed"
        );

        queue.clear();
        voice.force_stop_and_cleanup().await;

        let flow_signal = match request.flow {
            FlowMode::ContinueCapture => {
                let reselected = match self.picker.pick_from_library(queue.max_items()).await {
                    Ok(items) => queue.select(items).accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "media reselection failed; continuing with an empty queue");
                        0
                    }
                };
                FlowSignal::Continue { reselected }
            }
            FlowMode::Exit => FlowSignal::Close,
        };

        Ok(SubmitBatchResponse {
            device_session_id,
            report,
            flow_signal,
        })
    }
}
