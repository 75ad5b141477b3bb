// src/entity/artifact.rs
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filename of the single document inside every artifact directory.
pub const DOCUMENT_NAME: &str = "index.html";

/// One generated, self-contained document and where it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Title the artifact was saved under. Artifacts read back from disk
    /// carry the sanitized title from their directory name.
    pub title: String,
    pub content: String,
    /// The artifact's own directory.
    pub location: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Directory name, which doubles as the artifact identity.
    pub fn name(&self) -> String {
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn document_path(&self) -> PathBuf {
        document_path(&self.location)
    }
}

pub fn document_path(location: &Path) -> PathBuf {
    location.join(DOCUMENT_NAME)
}
