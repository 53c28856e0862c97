use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use capture_domain::{DomainError, TranscriptionPort};

const SERVICE: &str = "transcription";

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

pub struct RestTranscriptionAdapter {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    language: String,
}

impl RestTranscriptionAdapter {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        language: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            request_timeout,
            language: language.into(),
        }
    }
}

#[async_trait]
impl TranscriptionPort for RestTranscriptionAdapter {
    async fn transcribe(&self, audio_uri: &str) -> Result<String, DomainError> {
        let bytes = tokio::fs::read(audio_uri).await.map_err(|err| {
            DomainError::internal_error(&format!("could not read clip `{audio_uri}`: {err}"))
        })?;
        let form = Form::new()
            .text("language", self.language.clone())
            .part("audio", Part::bytes(bytes).file_name(file_name_of(audio_uri)));

        let request = self
            .http
            .post(format!("{}/transcriptions", self.base_url))
            .multipart(form);

        let response = tokio::time::timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| DomainError::external_service_error(SERVICE, "request timed out"))?
            .map_err(|err| DomainError::external_service_error(SERVICE, &err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::external_service_error(
                SERVICE,
                &format!("unexpected status {status}"),
            ));
        }

        let body: TranscriptionBody = response
            .json()
            .await
            .map_err(|err| DomainError::external_service_error(SERVICE, &err.to_string()))?;
        tracing::debug!(chars = body.text.len(), "transcription received");
        Ok(body.text)
    }
}

fn file_name_of(uri: &str) -> String {
    Path::new(uri)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip.wav".to_string())
}
