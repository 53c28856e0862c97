use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};

use capture_domain::{
    ConnectivityPort, ConnectivityStatus, DomainError, MediaItem, QuotaPort, RemoteRecord,
    StorageUsage, UploadMetadata, UploadSinkPort,
};

const SERVICE: &str = "media-store";

pub struct RestUploadSink {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    bearer_token: Option<String>,
}

impl RestUploadSink {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            request_timeout,
            bearer_token,
        }
    }
}

#[async_trait]
impl UploadSinkPort for RestUploadSink {
    async fn create(
        &self,
        item: &MediaItem,
        metadata: &UploadMetadata,
        skip_refresh: bool,
    ) -> Result<RemoteRecord, DomainError> {
        let payload = serde_json::to_string(metadata).map_err(|err| {
            DomainError::internal_error(&format!("metadata serialization failed: {err}"))
        })?;
        let bytes = tokio::fs::read(&item.uri).await.map_err(|err| {
            DomainError::internal_error(&format!("could not read media file `{}`: {err}", item.uri))
        })?;

        let form = Form::new()
            .text("metadata", payload)
            .text("kind", item.kind.as_str())
            .part("file", Part::bytes(bytes).file_name(file_name_of(&item.uri)));

        let request = self
            .http
            .post(format!("{}/media", self.base_url))
            .query(&[("skip_refresh", skip_refresh)])
            .multipart(form);

        let response = send(request, self.bearer_token.as_deref(), self.request_timeout).await?;
        response
            .json::<RemoteRecord>()
            .await
            .map_err(transport_error)
    }
}

pub struct RestQuotaSource {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    bearer_token: Option<String>,
}

impl RestQuotaSource {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            request_timeout,
            bearer_token,
        }
    }
}

#[async_trait]
impl QuotaPort for RestQuotaSource {
    async fn usage_snapshot(&self) -> Result<StorageUsage, DomainError> {
        let request = self.http.get(format!("{}/storage/usage", self.base_url));
        let response = send(request, self.bearer_token.as_deref(), self.request_timeout).await?;
        response
            .json::<StorageUsage>()
            .await
            .map_err(transport_error)
    }
}

/// Any response counts as online; only transport failures and timeouts mean
/// offline.
pub struct HttpConnectivityProbe {
    http: Client,
    probe_url: String,
    probe_timeout: Duration,
}

impl HttpConnectivityProbe {
    pub fn new(base_url: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            probe_url: format!("{}/health", base_url.into()),
            probe_timeout,
        }
    }
}

#[async_trait]
impl ConnectivityPort for HttpConnectivityProbe {
    async fn status(&self) -> ConnectivityStatus {
        let request = self.http.head(&self.probe_url).send();
        match tokio::time::timeout(self.probe_timeout, request).await {
            Ok(Ok(_)) => ConnectivityStatus::Online,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "connectivity probe failed");
                ConnectivityStatus::Offline
            }
            Err(_) => {
                tracing::debug!("connectivity probe timed out");
                ConnectivityStatus::Offline
            }
        }
    }
}

async fn send(
    request: RequestBuilder,
    bearer_token: Option<&str>,
    request_timeout: Duration,
) -> Result<reqwest::Response, DomainError> {
    let request = match bearer_token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };
    let response = tokio::time::timeout(request_timeout, request.send())
        .await
        .map_err(|_| DomainError::external_service_error(SERVICE, "request timed out"))?
        .map_err(transport_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DomainError::external_service_error(
            SERVICE,
            &format!("unexpected status {status}"),
        ));
    }
    Ok(response)
}

fn transport_error(err: reqwest::Error) -> DomainError {
    DomainError::external_service_error(SERVICE, &err.to_string())
}

fn file_name_of(uri: &str) -> String {
    Path::new(uri)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}
