pub mod author;
pub mod dto;
pub mod error;
pub mod usecase;
pub mod voicenote;

pub use author::{resolve_author, AuthorIdentity, UNKNOWN_AUTHOR};
pub use dto::*;
pub use error::ApplicationError;
pub use usecase::{LocationProbe, LocationProbeImpl, SubmitBatchUseCase, SubmitBatchUseCaseImpl};
pub use voicenote::{VoiceNoteSession, VoiceNoteSnapshot};
