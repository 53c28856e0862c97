pub mod audio;
pub mod context;
pub mod media;

pub use audio::{LocalPlayback, LocalRecorder};
pub use context::{StaticAuthContext, StaticLocationSource, StaticPermissions};
pub use media::FsMediaLibrary;
