use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::naming;
use crate::entity::{document_path, Artifact};
use crate::error::{EduforgeError, Result};

/// A saved artifact as seen in a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub title: String,
    pub location: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Path of the archive, when one has been built.
    pub archive: Option<PathBuf>,
}

/// Owns the output root. Every save lands in a fresh directory; nothing is
/// ever overwritten or deleted.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    current: Option<PathBuf>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the most recent save (or adopted artifact).
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn save(&mut self, content: &str, title: &str) -> Result<Artifact> {
        self.save_at(content, title, Utc::now())
    }

    /// Save with an explicit creation time.
    pub fn save_at(&mut self, content: &str, title: &str, at: DateTime<Utc>) -> Result<Artifact> {
        fs::create_dir_all(&self.root)?;

        let base = naming::dir_name(title, &at);
        let location = self.claim_location(&base)?;
        fs::write(document_path(&location), content)?;

        info!(location = %location.display(), bytes = content.len(), "saved artifact");
        self.current = Some(location.clone());

        Ok(Artifact {
            title: title.to_string(),
            content: content.to_string(),
            location,
            created_at: at,
        })
    }

    /// Create the first unused directory for `base`: `base`, then `base-2`,
    /// `base-3`, ... Creation itself is the existence check, so two writers
    /// never share a directory.
    fn claim_location(&self, base: &str) -> Result<PathBuf> {
        for n in 1u32.. {
            let location = if n == 1 {
                self.root.join(base)
            } else {
                self.root.join(format!("{}-{}", base, n))
            };
            match fs::create_dir(&location) {
                Ok(()) => return Ok(location),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(EduforgeError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free directory name left for {}", base),
        )))
    }

    /// Read a saved artifact back from its directory.
    pub fn load(&self, location: &Path) -> Result<Artifact> {
        let document = document_path(location);
        if !document.is_file() {
            return Err(EduforgeError::NotFound(format!(
                "no artifact at {}",
                location.display()
            )));
        }
        let content = fs::read_to_string(&document)?;
        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (title, created_at) = match naming::parse_dir_name(&name) {
            Some((title, at)) => (title.to_string(), at),
            None => (name.clone(), modified_at(&document)?),
        };

        Ok(Artifact {
            title,
            content,
            location: location.to_path_buf(),
            created_at,
        })
    }

    /// Make an existing saved artifact the current one.
    pub fn adopt(&mut self, location: &Path) -> Result<Artifact> {
        let artifact = self.load(location)?;
        self.current = Some(artifact.location.clone());
        Ok(artifact)
    }

    /// Archive the current artifact.
    pub fn archive_current(&self) -> Result<PathBuf> {
        let location = self.current.as_deref().ok_or_else(|| {
            EduforgeError::NotFound("nothing has been generated yet".to_string())
        })?;
        self.archive(location)
    }

    /// Bundle an artifact directory into `<root>/<dir name>.zip`. The source
    /// directory is left in place.
    pub fn archive(&self, location: &Path) -> Result<PathBuf> {
        if !location.is_dir() {
            return Err(EduforgeError::NotFound(format!(
                "artifact directory {} does not exist",
                location.display()
            )));
        }

        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EduforgeError::NotFound(location.display().to_string()))?;
        fs::create_dir_all(&self.root)?;
        let zip_path = self.root.join(format!("{}.zip", name));
        let partial = self.root.join(format!("{}.zip.part", name));

        if let Err(e) = write_zip(location, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &zip_path)?;

        info!(archive = %zip_path.display(), "archived artifact");
        Ok(zip_path)
    }

    /// Saved artifacts under the root, newest first.
    pub fn list(&self) -> Result<Vec<ArtifactSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let location = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !naming::is_artifact_name(&name) || !document_path(&location).is_file() {
                continue;
            }

            let (title, created_at) = match naming::parse_dir_name(&name) {
                Some((title, at)) => (title.to_string(), at),
                None => (name.clone(), modified_at(&document_path(&location))?),
            };
            let zip_path = self.root.join(format!("{}.zip", name));

            summaries.push(ArtifactSummary {
                archive: zip_path.is_file().then_some(zip_path),
                name,
                title,
                location,
                created_at,
            });
        }

        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.name.cmp(&a.name))
        });
        debug!(count = summaries.len(), "listed artifacts");
        Ok(summaries)
    }

    /// The newest saved artifact, if any.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.into_iter().next().map(|s| s.location))
    }
}

fn modified_at(path: &Path) -> Result<DateTime<Utc>> {
    Ok(fs::metadata(path)?.modified()?.into())
}

fn write_zip(source: &Path, target: &Path) -> Result<()> {
    let file = File::create(target)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}
