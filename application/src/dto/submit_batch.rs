use serde::{Deserialize, Serialize};
use validator::Validate;

use capture_domain::{BatchReport, LocationFix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    ContinueCapture,
    Exit,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitBatchRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(max = 10))]
    pub severity_level: u8,
    #[validate(length(min = 1, max = 64))]
    pub anomaly_type: String,
    #[validate(length(min = 1, max = 64))]
    pub anomaly_category: String,
    pub location: Option<LocationFix>,
    pub flow: FlowMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitBatchResponse {
    pub device_session_id: String,
    pub report: BatchReport,
    pub flow_signal: FlowSignal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSignal {
    Continue { reselected: usize },
    Close,
}
