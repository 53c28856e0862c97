use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub uri: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    Idle,
    Recording,
    Recorded,
    Playing,
}

impl Default for RecordingState {
    fn default() -> Self {
        RecordingState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceNote {
    pub uri: String,
    pub duration_seconds: u64,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub horizontal_accuracy: Option<f64>,
    pub vertical_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub severity_level: u8,
    pub anomaly_type: String,
    pub anomaly_category: String,
    pub author_name: String,
    pub author_id: Option<String>,
    pub device_session_id: String,
    pub location: Option<LocationFix>,
    pub voice_note: Option<VoiceNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_index: usize,
    pub outcome: SubmissionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let succeeded_count = outcomes
            .iter()
            .filter(|o| matches!(o.outcome, SubmissionOutcome::Succeeded))
            .count();
        let failed_count = outcomes.len() - succeeded_count;
        Self {
            succeeded_count,
            failed_count,
            outcomes,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub used_units: u64,
    pub quota_units: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Microphone,
    Camera,
    PhotoLibrary,
    Location,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Microphone => "microphone",
            Capability::Camera => "camera",
            Capability::PhotoLibrary => "photo_library",
            Capability::Location => "location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionReport {
    pub accepted: usize,
    pub truncated: usize,
}

impl SelectionReport {
    pub fn was_truncated(&self) -> bool {
        self.truncated > 0
    }
}

#[derive(Debug, Clone)]
pub struct CaptureQueue {
    items: Vec<MediaItem>,
    active_index: usize,
    max_items: usize,
}

impl CaptureQueue {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            active_index: 0,
            max_items,
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.active_index
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.active_index)
    }

    pub fn select(&mut self, items: Vec<MediaItem>) -> SelectionReport {
        self.items.clear();
        self.active_index = 0;
        self.extend_bounded(items)
    }

    pub fn append(&mut self, items: Vec<MediaItem>) -> SelectionReport {
        self.extend_bounded(items)
    }

    fn extend_bounded(&mut self, items: Vec<MediaItem>) -> SelectionReport {
        let room = self.max_items.saturating_sub(self.items.len());
        let offered = items.len();
        let accepted = offered.min(room);
        self.items.extend(items.into_iter().take(room));
        let truncated = offered - accepted;
        if truncated > 0 {
            tracing::warn!(
                offered,
                accepted,
                max_items = self.max_items,
                "media selection truncated at the queue bound"
            );
        }
        SelectionReport { accepted, truncated }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<MediaItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        if self.active_index >= self.items.len() {
            self.active_index = 0;
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.active_index = 0;
    }

    pub fn next(&mut self) -> Option<&MediaItem> {
        if self.items.is_empty() {
            return None;
        }
        self.active_index = (self.active_index + 1) % self.items.len();
        self.items.get(self.active_index)
    }

    pub fn previous(&mut self) -> Option<&MediaItem> {
        if self.items.is_empty() {
            return None;
        }
        self.active_index = (self.active_index + self.items.len() - 1) % self.items.len();
        self.items.get(self.active_index)
    }
}
