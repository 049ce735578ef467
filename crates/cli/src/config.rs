use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use luya_store::{
    Installer, InstallerConfig, LibraryInstaller, NoopLibraryInstaller, VendorLibraryInstaller,
    WritePolicy,
};
use tokio::fs;

use crate::cli::Cli;

/// Settings resolved from flags, the environment and the project's composer.json.
#[derive(Debug, Clone)]
pub struct Settings {
    pub installer: InstallerConfig,
}

impl Settings {
    pub async fn from_cli(cli: &Cli) -> Result<Self> {
        Self::resolve(&cli.project_dir, cli.vendor_dir.as_deref(), cli.strict).await
    }

    pub async fn resolve(project_dir: &Path, vendor_dir: Option<&str>, strict: bool) -> Result<Self> {
        let project_dir = fs::canonicalize(project_dir)
            .await
            .wrap_err_with(|| format!("Project directory {} not found", project_dir.display()))?;

        let mut installer = InstallerConfig::from_project(&project_dir)
            .await
            .wrap_err("Failed to load project config")?;

        if let Some(vendor_dir) = vendor_dir {
            installer = installer.with_vendor_dir(vendor_dir);
        }
        if strict {
            installer = installer.with_write_policy(WritePolicy::Fail);
        }

        Ok(Self { installer })
    }

    pub fn vendor_path(&self) -> PathBuf {
        self.installer.vendor_path()
    }

    /// Build an installer; `registry_only` skips touching the vendor tree.
    pub fn installer(&self, registry_only: bool) -> Installer {
        let library: Box<dyn LibraryInstaller> = if registry_only {
            Box::new(NoopLibraryInstaller)
        } else {
            Box::new(VendorLibraryInstaller::new(self.vendor_path()))
        };
        Installer::new(self.installer.clone(), library)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             ├─ project_dir: {}\n\
             ├─ vendor_dir: {}\n\
             ├─ registry: {}\n\
             └─ write_policy: {:?}",
            self.installer.project_dir.display(),
            self.installer.vendor_dir,
            self.installer.registry_path().display(),
            self.installer.write_policy,
        )
    }
}
