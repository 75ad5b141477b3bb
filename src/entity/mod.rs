mod artifact;
mod spec;

pub use artifact::{document_path, Artifact, DOCUMENT_NAME};
pub use spec::{InteractionRule, RequiredField, ToolSpecification};
