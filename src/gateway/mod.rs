//! Generation gateway.
//!
//! The single seam between this crate and the external text/vision model.
//! A backend is stateless: each call is one request and one response, and
//! any continuity (such as the current artifact) travels inside the request.
//! There is no retry, streaming or partial result.

mod openai;
mod scripted;

pub use openai::OpenAiBackend;
pub use scripted::ScriptedBackend;

use std::fs;
use std::path::Path;

use base64::Engine;

use crate::error::{EduforgeError, Result};
use crate::prompt::{Request, VisionRequest};

pub trait GenerationBackend {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// One text completion round trip. Envelope problems (transport errors,
    /// timeouts, empty or undecodable responses) fail with `Backend`.
    fn complete(&self, request: &Request) -> Result<String>;

    /// Describe one image as free prose.
    fn describe_image(&self, request: &VisionRequest) -> Result<String>;
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, request: &Request) -> Result<String> {
        (**self).complete(request)
    }

    fn describe_image(&self, request: &VisionRequest) -> Result<String> {
        (**self).describe_image(request)
    }
}

/// An encoded image for the vision path.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Read an image file. The media type comes from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let media_type = media_type_for(path).ok_or_else(|| {
            EduforgeError::Import(format!(
                "unsupported image type: {} (expected png, jpg, gif or webp)",
                path.display()
            ))
        })?;
        let bytes = fs::read(path).map_err(|e| {
            EduforgeError::Import(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::new(bytes, media_type))
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
