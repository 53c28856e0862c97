use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use capture_domain::{DomainError, MediaItem, MediaKind, MediaPickerPort};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "heic"];
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "m4v"];

// Enough of a JPEG for anything that just sniffs the magic bytes.
const STUB_JPEG: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

pub struct FsMediaLibrary {
    library_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl FsMediaLibrary {
    pub fn new(library_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
            scratch_dir: scratch_dir.into(),
        }
    }
}

#[async_trait]
impl MediaPickerPort for FsMediaLibrary {
    async fn pick_from_library(&self, max_count: usize) -> Result<Vec<MediaItem>, DomainError> {
        let mut dir = tokio::fs::read_dir(&self.library_dir).await.map_err(|err| {
            DomainError::internal_error(&format!(
                "could not open media library `{}`: {err}",
                self.library_dir.display()
            ))
        })?;

        let mut items = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|err| {
            DomainError::internal_error(&format!("could not list media library: {err}"))
        })? {
            let path = entry.path();
            let Some(kind) = kind_for(&path) else {
                continue;
            };
            let file_size_bytes = entry.metadata().await.ok().map(|meta| meta.len());
            items.push(MediaItem {
                uri: path.to_string_lossy().into_owned(),
                kind,
                width: None,
                height: None,
                file_size_bytes,
            });
        }

        // Directory order is arbitrary; sort so truncation is deterministic.
        items.sort_by(|a, b| a.uri.cmp(&b.uri));
        items.truncate(max_count);
        tracing::debug!(count = items.len(), "media library listed");
        Ok(items)
    }

    async fn capture_from_camera(&self) -> Result<MediaItem, DomainError> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|err| {
                DomainError::internal_error(&format!(
                    "could not create scratch dir `{}`: {err}",
                    self.scratch_dir.display()
                ))
            })?;
        let path = self.scratch_dir.join(format!("photo-{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, STUB_JPEG).await.map_err(|err| {
            DomainError::internal_error(&format!("could not write captured photo: {err}"))
        })?;
        tracing::debug!(path = %path.display(), "camera frame captured");
        Ok(MediaItem {
            uri: path.to_string_lossy().into_owned(),
            kind: MediaKind::Image,
            width: None,
            height: None,
            file_size_bytes: Some(STUB_JPEG.len() as u64),
        })
    }
}

fn kind_for(path: &Path) -> Option<MediaKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}
