pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod preview;
pub mod prompt;
pub mod session;
pub mod storage;
pub mod warnings;

pub use config::Config;
pub use error::{EduforgeError, Result};
pub use gateway::{GenerationBackend, OpenAiBackend, ScriptedBackend};
pub use prompt::PromptCompiler;
pub use session::{Session, Studio};
pub use storage::ArtifactStore;
