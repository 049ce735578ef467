use std::path::{Path, PathBuf};

use async_trait::async_trait;
use luya_types::{Registry, REGISTRY_FILE, VENDOR_DIR_PLACEHOLDER};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use crate::error::{InstallerError, Result};

/// A parsed registry together with the fingerprint of the bytes it came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub registry: Registry,
    /// `None` when no registry file existed.
    pub fingerprint: Option<String>,
}

/// Persistence for the generated registry file
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Location of the registry file
    fn path(&self) -> &Path;

    /// Check whether a registry file is present
    async fn exists(&self) -> bool;

    /// Read and parse the registry. A missing file yields an empty registry.
    async fn load(&self) -> Result<Snapshot>;

    /// Fingerprint of the current file content without parsing it
    async fn fingerprint(&self) -> Result<Option<String>>;

    /// Replace the registry file with `registry`.
    ///
    /// The write is refused with [`InstallerError::ConcurrentModification`] when
    /// the file on disk no longer matches `expected`, the fingerprint observed
    /// when the registry was loaded.
    async fn write(&self, registry: &Registry, expected: Option<&str>) -> Result<()>;
}

#[async_trait]
impl<T: RegistryStore + ?Sized> RegistryStore for std::sync::Arc<T> {
    fn path(&self) -> &Path {
        (**self).path()
    }

    async fn exists(&self) -> bool {
        (**self).exists().await
    }

    async fn load(&self) -> Result<Snapshot> {
        (**self).load().await
    }

    async fn fingerprint(&self) -> Result<Option<String>> {
        (**self).fingerprint().await
    }

    async fn write(&self, registry: &Registry, expected: Option<&str>) -> Result<()> {
        (**self).write(registry, expected).await
    }
}

/// SHA-256 of raw registry bytes, hex encoded
pub fn fingerprint(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Registry stored as pretty-printed JSON at `<vendor>/luyadev/installer.json`.
#[derive(Debug, Clone)]
pub struct JsonRegistryStore {
    registry_path: PathBuf,
}

impl JsonRegistryStore {
    pub fn new<P: AsRef<Path>>(registry_path: P) -> Self {
        Self {
            registry_path: registry_path.as_ref().to_path_buf(),
        }
    }

    pub fn for_vendor_dir<P: AsRef<Path>>(vendor_dir: P) -> Self {
        Self::new(vendor_dir.as_ref().join(REGISTRY_FILE))
    }

    /// The vendor root the placeholder stands for: two levels above the file.
    pub fn vendor_root(&self) -> Option<&Path> {
        self.registry_path.parent().and_then(Path::parent)
    }

    /// Parse registry bytes, expanding `<vendor-dir>` against this file's location.
    pub fn decode(&self, data: &[u8]) -> Result<Registry> {
        let mut registry: Registry =
            serde_json::from_slice(data).map_err(|source| InstallerError::CorruptedRegistry {
                path: self.registry_path.clone(),
                source,
            })?;

        if let Some(root) = self.vendor_root() {
            let root = root_string(root);
            registry.rewrite_blocks(|block| {
                block
                    .strip_prefix(VENDOR_DIR_PLACEHOLDER)
                    .map(|rest| format!("{}{}", root, rest))
            });
        }

        Ok(registry)
    }

    /// Serialize a registry, replacing an absolute vendor root with `<vendor-dir>`.
    pub fn encode(&self, registry: &Registry) -> Result<Vec<u8>> {
        let mut portable = registry.clone();

        if let Some(root) = self.vendor_root().filter(|root| root.is_absolute()) {
            let root = root_string(root);
            portable.rewrite_blocks(|block| {
                let rest = block.strip_prefix(root.as_str())?;
                if rest.is_empty() || rest.starts_with(['/', '\\']) {
                    Some(format!("{}{}", VENDOR_DIR_PLACEHOLDER, rest))
                } else {
                    None
                }
            });
        }

        let mut data = serde_json::to_vec_pretty(&portable)?;
        data.push(b'\n');
        Ok(data)
    }

    async fn read_bytes(&self) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(&self.registry_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write_error(&self, source: std::io::Error) -> InstallerError {
        InstallerError::RegistryWrite {
            path: self.registry_path.clone(),
            source,
        }
    }
}

fn root_string(root: &Path) -> String {
    root.to_string_lossy()
        .trim_end_matches(['/', '\\'])
        .to_string()
}

#[async_trait]
impl RegistryStore for JsonRegistryStore {
    fn path(&self) -> &Path {
        &self.registry_path
    }

    async fn exists(&self) -> bool {
        fs::try_exists(&self.registry_path).await.unwrap_or(false)
    }

    async fn load(&self) -> Result<Snapshot> {
        let Some(data) = self
            .read_bytes()
            .await
            .map_err(|e| InstallerError::io_operation("read registry", &self.registry_path, e))?
        else {
            debug!("No registry at {}, starting empty", self.registry_path.display());
            return Ok(Snapshot {
                registry: Registry::new(),
                fingerprint: None,
            });
        };

        let registry = self.decode(&data)?;
        debug!(
            "Loaded registry with {} packages from {}",
            registry.len(),
            self.registry_path.display()
        );

        Ok(Snapshot {
            registry,
            fingerprint: Some(fingerprint(&data)),
        })
    }

    async fn fingerprint(&self) -> Result<Option<String>> {
        let data = self
            .read_bytes()
            .await
            .map_err(|e| InstallerError::io_operation("read registry", &self.registry_path, e))?;
        Ok(data.as_deref().map(fingerprint))
    }

    async fn write(&self, registry: &Registry, expected: Option<&str>) -> Result<()> {
        let dir = self
            .registry_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(dir)
            .await
            .map_err(|e| self.write_error(e))?;

        let current = self.read_bytes().await.map_err(|e| self.write_error(e))?;
        if current.as_deref().map(fingerprint).as_deref() != expected {
            return Err(InstallerError::ConcurrentModification(
                self.registry_path.clone(),
            ));
        }

        let data = self.encode(registry)?;

        // Readers only ever see the old or the new file
        let temp = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        fs::write(temp.path(), &data)
            .await
            .map_err(|e| self.write_error(e))?;
        temp.persist(&self.registry_path)
            .map_err(|e| self.write_error(e.error))?;

        debug!(
            "Registry with {} packages written to {}",
            registry.len(),
            self.registry_path.display()
        );
        Ok(())
    }
}
