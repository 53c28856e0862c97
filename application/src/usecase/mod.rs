mod acquire_location;
mod submit_batch;

pub use acquire_location::{LocationProbe, LocationProbeImpl};
pub use submit_batch::{SubmitBatchUseCase, SubmitBatchUseCaseImpl};
