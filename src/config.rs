use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EduforgeError, Result};
use crate::prompt::{Locale, DEFAULT_MAX_REQUEST_BYTES};

/// Project-local config file name, looked up in the working directory.
pub const LOCAL_CONFIG: &str = "eduforge.toml";

/// Settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// OpenAI-compatible API root, e.g. "https://api.openai.com/v1"
    pub base_url: String,
    /// Model for compose and revise rounds
    pub model: String,
    /// Model for image descriptions
    pub vision_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for saved artifacts and archives
    pub output_dir: PathBuf,
    pub locale: Locale,
    /// Upper bound on instruction + artifact bytes for one request
    pub max_request_bytes: usize,
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            locale: Locale::default(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Resolve configuration.
    ///
    /// An explicit path must exist. Otherwise `./eduforge.toml`, then
    /// `<config dir>/eduforge/config.toml`, then defaults. Environment
    /// overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(EduforgeError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match Self::default_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let input = fs::read_to_string(path)?;
        Self::from_toml(&input)
    }

    pub fn from_toml(input: &str) -> Result<Self> {
        let config: Config = toml::from_str(input)?;
        if config.max_request_bytes == 0 {
            return Err(EduforgeError::Config(
                "max_request_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("eduforge").join("config.toml"));
        }
        paths
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = env::var("EDUFORGE_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(locale) = env::var("EDUFORGE_LOCALE") {
            self.locale = locale.parse().map_err(EduforgeError::Config)?;
        }
        if let Ok(model) = env::var("EDUFORGE_MODEL") {
            if !model.trim().is_empty() {
                self.backend.model = model;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.locale, Locale::English);
        assert_eq!(config.backend.model, "gpt-4o-mini");
        assert_eq!(config.backend.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            locale = "sr"

            [backend]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.locale, Locale::Serbian);
        assert_eq!(config.backend.model, "gpt-4o");
        assert_eq!(config.backend.vision_model, "gpt-4o-mini");
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
    }

    #[test]
    fn test_rejects_zero_ceiling() {
        assert!(matches!(
            Config::from_toml("max_request_bytes = 0"),
            Err(EduforgeError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_locale() {
        assert!(matches!(
            Config::from_toml(r#"locale = "xx""#),
            Err(EduforgeError::Toml(_))
        ));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(EduforgeError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("eduforge.toml");
        fs::write(&path, "output_dir = \"out\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
