use thiserror::Error;

use crate::entity::RequiredField;

#[derive(Error, Debug)]
pub enum EduforgeError {
    #[error("Missing required fields: {}", field_list(.missing))]
    Validation { missing: Vec<RequiredField> },

    #[error("Instruction is empty")]
    EmptyInstruction,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Request too large: {size} bytes (limit {limit})")]
    RequestTooLarge { size: usize, limit: usize },

    #[error("No generated artifact yet. Generate one first.")]
    NoArtifact,

    #[error("A generation round is already in progress")]
    RoundInFlight,

    #[error("Not allowed here: {0}")]
    Transition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn field_list(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, EduforgeError>;
