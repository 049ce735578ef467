use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use luya_store::read_manifest;
use luya_types::{PackageDescriptor, PackageType};
use tracing::{info, warn};

use crate::config::Settings;

/// Handle the supports command - report whether a package type is handled
pub fn handle_supports_command(package_type: &str) -> Result<()> {
    if PackageType::supports(package_type) {
        println!("✅ '{}' packages are handled by the LUYA installer", package_type);
    } else {
        println!("❌ '{}' packages are not handled by the LUYA installer", package_type);
        println!(
            "💡 Supported types: {}",
            PackageType::ALL.map(|ty| ty.as_str()).join(", ")
        );
    }
    Ok(())
}

pub async fn handle_install_command(
    settings: &Settings,
    package_dir: PathBuf,
    package_version: Option<String>,
    registry_only: bool,
) -> Result<()> {
    let package = load_package(&package_dir, package_version).await?;
    let installer = settings.installer(registry_only);

    info!("Installing {} from {}", package.name, package_dir.display());
    installer
        .install(&package)
        .await
        .wrap_err_with(|| format!("Failed to install {}", package.name))?;

    println!("📦 Installed {} ({})", package.pretty_name, package.version);
    print_contributions(&installer.entry_for(&package));
    Ok(())
}

pub async fn handle_update_command(
    settings: &Settings,
    package_dir: PathBuf,
    package_version: Option<String>,
    registry_only: bool,
) -> Result<()> {
    let target = load_package(&package_dir, package_version).await?;
    let installer = settings.installer(registry_only);

    let registry = installer.load_registry().await?;
    let initial = match registry.get(&target.name) {
        Some(entry) => PackageDescriptor::new(
            entry.package.pretty_name.clone(),
            entry.package.version.clone(),
            target.package_type.clone(),
        )
        .with_name(entry.package.name.clone()),
        None => {
            warn!("{} is not registered, updating in place", target.name);
            PackageDescriptor {
                source: None,
                ..target.clone()
            }
        }
    };

    installer
        .update(&initial, &target)
        .await
        .wrap_err_with(|| format!("Failed to update {}", target.name))?;

    println!(
        "🔄 Updated {} ({} -> {})",
        target.pretty_name, initial.version, target.version
    );
    print_contributions(&installer.entry_for(&target));
    Ok(())
}

pub async fn handle_uninstall_command(
    settings: &Settings,
    name: String,
    registry_only: bool,
) -> Result<()> {
    let installer = settings.installer(registry_only);
    let registry = installer.load_registry().await?;
    let name = name.to_lowercase();

    let package = match registry.get(&name) {
        Some(entry) => PackageDescriptor::new(
            entry.package.pretty_name.clone(),
            entry.package.version.clone(),
            PackageType::Module.as_str(),
        )
        .with_name(entry.package.name.clone()),
        None if registry_only => {
            println!("💡 {} is not registered, nothing to do", name);
            return Ok(());
        }
        None => read_manifest(&settings.vendor_path().join(&name))
            .await
            .wrap_err_with(|| format!("Package {} is not installed", name))?,
    };

    installer
        .uninstall(&package)
        .await
        .wrap_err_with(|| format!("Failed to uninstall {}", package.name))?;

    println!("🗑️  Uninstalled {}", package.pretty_name);
    Ok(())
}

async fn load_package(package_dir: &Path, package_version: Option<String>) -> Result<PackageDescriptor> {
    let mut package = read_manifest(package_dir)
        .await
        .wrap_err_with(|| format!("No usable package in {}", package_dir.display()))?;

    if let Some(version) = package_version {
        package.version = version;
    }

    package.package_type().wrap_err_with(|| {
        format!("Package {} is not handled by the LUYA installer", package.name)
    })?;

    Ok(package)
}

fn print_contributions(entry: &luya_types::PackageEntry) {
    if entry.blocks.is_empty() && entry.bootstrap.is_empty() {
        println!("  (no blocks or bootstrap classes declared)");
        return;
    }
    for block in &entry.blocks {
        println!("  🧱 {}", block);
    }
    for bootstrap in &entry.bootstrap {
        match bootstrap.as_str() {
            Some(class) => println!("  🚀 {}", class),
            None => println!("  🚀 {}", bootstrap),
        }
    }
}
