//! The LUYA installer: keeps `luyadev/installer.json` in step with the
//! packages the package manager installs, updates and removes.
//!
//! Every lifecycle call first lets the [`LibraryInstaller`] do the physical
//! work and then runs a single read-modify-write transaction on the registry.
//! Transactions carry the fingerprint of what they read; a write that finds a
//! different file on disk is retried from the read.

use std::path::Path;
use std::sync::Arc;

use luya_types::{PackageDescriptor, PackageEntry, PackageInfo, PackageType, Registry};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::{CacheInvalidator, NoopInvalidator};
use crate::config::{InstallerConfig, WritePolicy};
use crate::error::{InstallerError, Result};
use crate::io::{ConsoleIo, OperatorIo};
use crate::library::LibraryInstaller;
use crate::registry::{JsonRegistryStore, RegistryStore, Snapshot};

pub struct Installer {
    config: InstallerConfig,
    library: Box<dyn LibraryInstaller>,
    store: Box<dyn RegistryStore>,
    invalidator: Arc<dyn CacheInvalidator>,
    io: Arc<dyn OperatorIo>,
    relative_vendor_dir: OnceCell<String>,
}

impl Installer {
    /// Create an installer writing to the registry file under the configured vendor dir.
    pub fn new(config: InstallerConfig, library: Box<dyn LibraryInstaller>) -> Self {
        let store = Box::new(JsonRegistryStore::new(config.registry_path()));
        Self {
            config,
            library,
            store,
            invalidator: Arc::new(NoopInvalidator),
            io: Arc::new(ConsoleIo),
            relative_vendor_dir: OnceCell::new(),
        }
    }

    pub fn with_store(mut self, store: Box<dyn RegistryStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    pub fn with_io(mut self, io: Arc<dyn OperatorIo>) -> Self {
        self.io = io;
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn registry_path(&self) -> &Path {
        self.store.path()
    }

    /// Only the LUYA package types are handled by this installer.
    pub fn supports(&self, package_type: &str) -> bool {
        PackageType::supports(package_type)
    }

    pub async fn install(&self, package: &PackageDescriptor) -> Result<()> {
        self.library.install(package).await?;
        self.add_package(package).await
    }

    pub async fn update(
        &self,
        initial: &PackageDescriptor,
        target: &PackageDescriptor,
    ) -> Result<()> {
        self.library.update(initial, target).await?;

        let entry = self.entry_for(target);
        self.commit(|registry| {
            registry.remove(&initial.name);
            registry.insert(entry.clone());
        })
        .await?;

        info!(
            "Registry updated {} {} -> {}",
            target.name, initial.version, target.version
        );
        Ok(())
    }

    pub async fn uninstall(&self, package: &PackageDescriptor) -> Result<()> {
        self.library.uninstall(package).await?;
        self.remove_package(package).await
    }

    /// Regenerate the registry from scratch, ignoring what is currently on disk.
    pub async fn rebuild(&self, packages: &[PackageDescriptor]) -> Result<Registry> {
        let mut registry = Registry::new();
        for package in packages {
            if !self.supports(&package.package_type) {
                debug!(
                    "Skipping {} with unsupported type '{}'",
                    package.name, package.package_type
                );
                continue;
            }
            registry.insert(self.entry_for(package));
        }

        self.write_registry(&registry).await?;
        info!("Rebuilt registry with {} packages", registry.len());
        Ok(registry)
    }

    /// The registry entry a package contributes.
    pub fn entry_for(&self, package: &PackageDescriptor) -> PackageEntry {
        let extra = package.luya_extra();
        let root = format!("{}/{}", self.relative_vendor_dir(), package.pretty_name);

        PackageEntry {
            package: PackageInfo::from(package),
            blocks: extra
                .blocks
                .iter()
                .map(|folder| format!("{}/{}", root, folder.trim_start_matches(['/', '\\'])))
                .collect(),
            bootstrap: extra.bootstrap,
        }
    }

    /// Vendor dir as it appears in block paths, computed once.
    pub fn relative_vendor_dir(&self) -> &str {
        self.relative_vendor_dir
            .get_or_init(|| self.config.relative_vendor_dir())
    }

    /// Current registry content; empty if the file does not exist yet.
    pub async fn load_registry(&self) -> Result<Registry> {
        Ok(self.load_snapshot().await?.registry)
    }

    /// Overwrite the registry file with `registry`.
    ///
    /// Failures are handled according to the configured [`WritePolicy`].
    pub async fn write_registry(&self, registry: &Registry) -> Result<()> {
        let mut registry = registry.clone();
        registry.touch();

        let result = match self.store.fingerprint().await {
            Ok(expected) => self.store.write(&registry, expected.as_deref()).await,
            Err(InstallerError::IoOperation { path, source, .. }) => {
                Err(InstallerError::RegistryWrite { path, source })
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.invalidator.invalidate(self.store.path());
                Ok(())
            }
            Err(e) if e.is_write_failure() => self.report_write_failure(e),
            Err(e) => Err(e),
        }
    }

    async fn add_package(&self, package: &PackageDescriptor) -> Result<()> {
        let entry = self.entry_for(package);
        self.commit(|registry| {
            registry.insert(entry.clone());
        })
        .await?;

        info!("Registered {} ({}) in the registry", package.name, package.version);
        Ok(())
    }

    async fn remove_package(&self, package: &PackageDescriptor) -> Result<()> {
        self.commit(|registry| {
            if registry.remove(&package.name).is_none() {
                debug!("{} was not registered", package.name);
            }
        })
        .await?;

        info!("Removed {} from the registry", package.name);
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Snapshot> {
        if self.store.exists().await {
            self.invalidator.invalidate(self.store.path());
        }

        let mut snapshot = self.store.load().await?;
        snapshot.registry.touch();
        Ok(snapshot)
    }

    /// Load, apply `change`, write back. Retries when another writer got there first.
    async fn commit<F>(&self, mut change: F) -> Result<()>
    where
        F: FnMut(&mut Registry),
    {
        let mut attempt = 0;
        loop {
            let mut snapshot = self.load_snapshot().await?;
            change(&mut snapshot.registry);

            match self
                .store
                .write(&snapshot.registry, snapshot.fingerprint.as_deref())
                .await
            {
                Ok(()) => {
                    self.invalidator.invalidate(self.store.path());
                    return Ok(());
                }
                Err(InstallerError::ConcurrentModification(path))
                    if attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    warn!(
                        "{} changed while it was being updated, retrying ({}/{})",
                        path.display(),
                        attempt,
                        self.config.max_retries
                    );
                }
                Err(e) if e.is_write_failure() => return self.report_write_failure(e),
                Err(e) => return Err(e),
            }
        }
    }

    fn report_write_failure(&self, err: InstallerError) -> Result<()> {
        warn!("Registry write failed: {}", err);
        self.io
            .write_error(&format!("Unable to create luya installer file: {}", err));

        match self.config.write_policy {
            WritePolicy::Warn => Ok(()),
            WritePolicy::Fail => Err(err),
        }
    }
}
