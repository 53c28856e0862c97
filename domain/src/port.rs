use async_trait::async_trait;

use crate::entity::{
    AuthenticatedUser, Capability, ConnectivityStatus, LocationFix, MediaItem, PermissionStatus,
    RemoteRecord, StorageUsage, UploadMetadata,
};
use crate::error::DomainError;

#[async_trait]
pub trait MediaPickerPort: Send + Sync {
    async fn pick_from_library(&self, max_count: usize) -> Result<Vec<MediaItem>, DomainError>;
    async fn capture_from_camera(&self) -> Result<MediaItem, DomainError>;
}

#[async_trait]
pub trait UploadSinkPort: Send + Sync {
    async fn create(
        &self,
        item: &MediaItem,
        metadata: &UploadMetadata,
        skip_refresh: bool,
    ) -> Result<RemoteRecord, DomainError>;
}

#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    async fn transcribe(&self, audio_uri: &str) -> Result<String, DomainError>;
}

#[async_trait]
pub trait ConnectivityPort: Send + Sync {
    async fn status(&self) -> ConnectivityStatus;
}

#[async_trait]
pub trait QuotaPort: Send + Sync {
    async fn usage_snapshot(&self) -> Result<StorageUsage, DomainError>;
}

#[async_trait]
pub trait AuthPort: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
    async fn current_user(&self) -> Option<AuthenticatedUser>;
}

#[async_trait]
pub trait PermissionsPort: Send + Sync {
    async fn request(&self, capability: Capability) -> Result<PermissionStatus, DomainError>;
}

#[async_trait]
pub trait LocationSourcePort: Send + Sync {
    async fn last_known(&self) -> Result<Option<LocationFix>, DomainError>;
    async fn current(&self) -> Result<LocationFix, DomainError>;
}

#[async_trait]
pub trait RecorderPort: Send + Sync {
    async fn start(&self) -> Result<Box<dyn ActiveRecording>, DomainError>;
}

/// Dropping the handle without finishing aborts the capture; the microphone
/// is released either way.
#[async_trait]
pub trait ActiveRecording: Send + Sync {
    async fn finish(self: Box<Self>) -> Result<Option<String>, DomainError>;
}

#[async_trait]
pub trait PlaybackPort: Send + Sync {
    async fn play(&self, uri: &str) -> Result<Box<dyn ActivePlayback>, DomainError>;
}

/// Dropping the handle stops the audio; `is_finished` turns true once the
/// clip reaches its natural end.
pub trait ActivePlayback: Send + Sync {
    fn is_finished(&self) -> bool;
}
