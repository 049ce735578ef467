use std::path::{Path, PathBuf};

use luya_types::REGISTRY_FILE;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{InstallerError, Result};

pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Environment variable that overrides the vendor directory of a project.
pub const VENDOR_DIR_ENV: &str = "COMPOSER_VENDOR_DIR";

/// What to do when the registry file cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Tell the operator and carry on.
    #[default]
    Warn,
    /// Tell the operator and fail the package operation.
    Fail,
}

#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub project_dir: PathBuf,
    /// Vendor directory as configured, relative to `project_dir` unless absolute.
    pub vendor_dir: String,
    pub write_policy: WritePolicy,
    /// How often a transaction is retried after losing a write race.
    pub max_retries: u32,
}

impl InstallerConfig {
    pub fn new<P: AsRef<Path>>(project_dir: P) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
            vendor_dir: DEFAULT_VENDOR_DIR.to_string(),
            write_policy: WritePolicy::default(),
            max_retries: 3,
        }
    }

    /// Build the configuration from the project's `composer.json` and environment.
    pub async fn from_project<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let project_dir = project_dir.as_ref();
        let composer = ComposerConfig::load(project_dir).await?;
        let vendor_dir = composer.resolve_vendor_dir(std::env::var(VENDOR_DIR_ENV).ok());
        Ok(Self::new(project_dir).with_vendor_dir(vendor_dir))
    }

    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<String>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// The vendor directory on disk
    pub fn vendor_path(&self) -> PathBuf {
        self.project_dir.join(&self.vendor_dir)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.vendor_path().join(REGISTRY_FILE)
    }

    /// The vendor directory as written into block paths.
    ///
    /// Trailing separators are trimmed. An absolute setting that points inside
    /// the project is made relative to it; anything else is kept as configured.
    pub fn relative_vendor_dir(&self) -> String {
        let trimmed = self.vendor_dir.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            return self.vendor_dir.clone();
        }

        let configured = Path::new(trimmed);
        if configured.is_absolute() {
            if let Ok(relative) = configured.strip_prefix(&self.project_dir) {
                let relative = relative.to_string_lossy().replace('\\', "/");
                return if relative.is_empty() {
                    ".".to_string()
                } else {
                    relative
                };
            }
        }

        trimmed.to_string()
    }
}

/// The `config` section of a root `composer.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerConfig {
    #[serde(rename = "vendor-dir")]
    pub vendor_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RootManifest {
    #[serde(default)]
    config: ComposerConfig,
}

impl ComposerConfig {
    pub async fn load(project_dir: &Path) -> Result<Self> {
        let manifest_path = project_dir.join("composer.json");
        let content = match fs::read_to_string(&manifest_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(InstallerError::io_operation("read", manifest_path, e)),
        };

        let manifest: RootManifest = serde_json::from_str(&content).map_err(|e| {
            InstallerError::Config(format!("invalid {}: {}", manifest_path.display(), e))
        })?;
        Ok(manifest.config)
    }

    /// Environment first, then `config.vendor-dir`, then the default.
    pub fn resolve_vendor_dir(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|value| !value.is_empty())
            .or_else(|| self.vendor_dir.clone())
            .unwrap_or_else(|| DEFAULT_VENDOR_DIR.to_string())
    }
}
