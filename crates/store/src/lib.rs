//! LUYA Store - registry maintenance for LUYA packages
//!
//! Packages of type `luya-core`, `luya-extension` and `luya-module` can declare
//! block folders and bootstrap classes under `extra.luya` in their manifest.
//! This crate keeps `<vendor>/luyadev/installer.json` listing those
//! contributions up to date as packages come and go, so the host application
//! can discover them at startup.
//!
//! # Examples
//!
//! ```rust,no_run
//! use luya_store::{Installer, InstallerConfig, NoopLibraryInstaller};
//! use luya_types::PackageDescriptor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InstallerConfig::from_project(".").await?;
//! let installer = Installer::new(config, Box::new(NoopLibraryInstaller));
//!
//! let package = PackageDescriptor::new("acme/luya-module-blog", "1.0.0", "luya-module");
//! installer.install(&package).await?;
//!
//! let registry = installer.load_registry().await?;
//! println!("{} packages registered", registry.len());
//! # Ok(())
//! # }
//! ```
pub mod cache;
pub mod config;
pub mod error;
pub mod installer;
pub mod io;
pub mod library;
pub mod manifest;
pub mod registry;

// Re-export commonly used types
pub use cache::{CacheInvalidator, NoopInvalidator, RegistryCache};
pub use config::{ComposerConfig, InstallerConfig, WritePolicy};
pub use error::{InstallerError, Result};
pub use installer::Installer;
pub use io::{BufferIo, ConsoleIo, OperatorIo};
pub use library::{LibraryInstaller, NoopLibraryInstaller, VendorLibraryInstaller};
pub use manifest::{discover_packages, read_manifest};
pub use registry::{JsonRegistryStore, RegistryStore, Snapshot};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Set up an installer for the project in `project_dir`
///
/// Reads the vendor directory from the project's `composer.json` and copies
/// packages into the vendor tree on install.
pub async fn init_default(project_dir: std::path::PathBuf) -> Result<Installer> {
    let config = InstallerConfig::from_project(&project_dir).await?;
    let library = Box::new(VendorLibraryInstaller::new(config.vendor_path()));
    Ok(Installer::new(config, library))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_default() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join("composer.json"),
            r#"{"config": {"vendor-dir": "packages/"}}"#,
        )
        .await
        .unwrap();

        let installer = init_default(temp_dir.path().to_path_buf()).await.unwrap();

        if std::env::var(config::VENDOR_DIR_ENV).is_err() {
            assert_eq!(installer.relative_vendor_dir(), "packages");
            assert_eq!(
                installer.registry_path(),
                temp_dir.path().join("packages/").join("luyadev/installer.json")
            );
        }
    }

    #[tokio::test]
    async fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "luya_store");
    }
}
