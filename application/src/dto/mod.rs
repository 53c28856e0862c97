mod submit_batch;

pub use submit_batch::{FlowMode, FlowSignal, SubmitBatchRequest, SubmitBatchResponse};
