//! Physical package operations performed before any registry bookkeeping.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use luya_types::PackageDescriptor;
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{InstallerError, Result};

/// The package manager's own install/update/uninstall of package files.
#[async_trait]
pub trait LibraryInstaller: Send + Sync {
    async fn install(&self, package: &PackageDescriptor) -> Result<()>;

    async fn update(&self, initial: &PackageDescriptor, target: &PackageDescriptor) -> Result<()>;

    async fn uninstall(&self, package: &PackageDescriptor) -> Result<()>;
}

/// For when the files are already in place and only the registry needs updating.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLibraryInstaller;

#[async_trait]
impl LibraryInstaller for NoopLibraryInstaller {
    async fn install(&self, _package: &PackageDescriptor) -> Result<()> {
        Ok(())
    }

    async fn update(&self, _initial: &PackageDescriptor, _target: &PackageDescriptor) -> Result<()> {
        Ok(())
    }

    async fn uninstall(&self, _package: &PackageDescriptor) -> Result<()> {
        Ok(())
    }
}

/// Copies package sources into `<vendor>/<pretty name>`.
#[derive(Debug, Clone)]
pub struct VendorLibraryInstaller {
    vendor_dir: PathBuf,
}

impl VendorLibraryInstaller {
    pub fn new<P: AsRef<Path>>(vendor_dir: P) -> Self {
        Self {
            vendor_dir: vendor_dir.as_ref().to_path_buf(),
        }
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    /// Where the files of `package` live inside the vendor tree
    pub fn install_path(&self, package: &PackageDescriptor) -> Result<PathBuf> {
        validate_pretty_name(&package.pretty_name)?;
        Ok(self.vendor_dir.join(&package.pretty_name))
    }

    /// Resolve where `package` would land, following symlinks in the vendor tree.
    async fn resolve_install_path(&self, package: &PackageDescriptor) -> Result<PathBuf> {
        validate_pretty_name(&package.pretty_name)?;
        fs::create_dir_all(&self.vendor_dir)
            .await
            .map_err(|e| InstallerError::io_operation("create vendor dir", &self.vendor_dir, e))?;
        let vendor = fs::canonicalize(&self.vendor_dir)
            .await
            .map_err(|e| InstallerError::io_operation("resolve vendor dir", &self.vendor_dir, e))?;

        let target = vendor.join(&package.pretty_name);
        match fs::canonicalize(&target).await {
            Ok(resolved) => Ok(resolved),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(target),
            Err(e) => Err(InstallerError::io_operation("resolve install path", &target, e)),
        }
    }

    async fn plan_copy(&self, package: &PackageDescriptor) -> Result<CopyPlan> {
        let source = package
            .source
            .as_deref()
            .ok_or_else(|| InstallerError::InvalidPackage {
                reason: format!("package '{}' has no source directory", package.name),
            })?;
        let source = fs::canonicalize(source)
            .await
            .map_err(|e| InstallerError::io_operation("resolve package source", source, e))?;
        let target = self.resolve_install_path(package).await?;

        if source == target {
            return Ok(CopyPlan::InPlace(target));
        }
        if overlaps(&source, &target) {
            return Err(InstallerError::InvalidPackage {
                reason: format!(
                    "source '{}' overlaps install path '{}'",
                    source.display(),
                    target.display()
                ),
            });
        }

        Ok(CopyPlan::Copy { source, target })
    }

    async fn copy_files(source: &Path, target: &Path) -> Result<()> {
        fs::create_dir_all(target)
            .await
            .map_err(|e| InstallerError::io_operation("create package dir", target, e))?;

        for entry in WalkDir::new(source).min_depth(1) {
            let entry =
                entry.map_err(|e| InstallerError::io_operation("walk package", source, e.into()))?;
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let dest = target.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest)
                    .await
                    .map_err(|e| InstallerError::io_operation("create dir", &dest, e))?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| InstallerError::io_operation("create dir", parent, e))?;
                }
                fs::copy(entry.path(), &dest)
                    .await
                    .map_err(|e| InstallerError::io_operation("copy file", &dest, e))?;
            }
        }

        Ok(())
    }

    async fn remove_package(&self, package: &PackageDescriptor) -> Result<()> {
        let target = self.install_path(package)?;
        match fs::remove_dir_all(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} was not present", target.display());
                Ok(())
            }
            Err(e) => Err(InstallerError::io_operation("remove package", &target, e)),
        }
    }
}

#[async_trait]
impl LibraryInstaller for VendorLibraryInstaller {
    async fn install(&self, package: &PackageDescriptor) -> Result<()> {
        match self.plan_copy(package).await? {
            CopyPlan::InPlace(target) => {
                debug!("{} is already in place at {}", package.pretty_name, target.display());
            }
            CopyPlan::Copy { source, target } => {
                Self::copy_files(&source, &target).await?;
                info!(
                    "Installed {} ({}) into {}",
                    package.pretty_name,
                    package.version,
                    target.display()
                );
            }
        }
        Ok(())
    }

    async fn update(&self, initial: &PackageDescriptor, target: &PackageDescriptor) -> Result<()> {
        // Everything is resolved and checked before the initial files go away
        let plan = self.plan_copy(target).await?;
        let previous = self.resolve_install_path(initial).await?;

        match plan {
            CopyPlan::InPlace(path) => {
                if previous != path {
                    self.remove_package(initial).await?;
                }
            }
            CopyPlan::Copy { source, target: path } => {
                if overlaps(&source, &previous) {
                    return Err(InstallerError::InvalidPackage {
                        reason: format!(
                            "source '{}' overlaps the installed files of {}",
                            source.display(),
                            initial.pretty_name
                        ),
                    });
                }
                self.remove_package(initial).await?;
                Self::copy_files(&source, &path).await?;
            }
        }

        info!(
            "Updated {} {} -> {}",
            target.pretty_name, initial.version, target.version
        );
        Ok(())
    }

    async fn uninstall(&self, package: &PackageDescriptor) -> Result<()> {
        self.remove_package(package).await?;
        info!("Removed {} from the vendor tree", package.pretty_name);
        Ok(())
    }
}

enum CopyPlan {
    /// The source already is the install directory.
    InPlace(PathBuf),
    Copy { source: PathBuf, target: PathBuf },
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn validate_pretty_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(InstallerError::InvalidPackage {
            reason: "package name cannot be empty".to_string(),
        });
    }

    let path = Path::new(name);
    if !path
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(InstallerError::InvalidPackage {
            reason: format!("package name '{}' is not a plain relative path", name),
        });
    }

    Ok(())
}
