mod artifact_store;
pub mod naming;

pub use artifact_store::{ArtifactStore, ArtifactSummary};
pub use naming::{sanitize_title, DEFAULT_TITLE};
