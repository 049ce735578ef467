use eyre::Result;
use luya_store::discover_packages;

use crate::config::Settings;

/// Handle the list command - show every registered package
pub async fn handle_list_command(settings: &Settings) -> Result<()> {
    let installer = settings.installer(true);
    let registry = installer.load_registry().await?;

    if registry.is_empty() {
        println!("📭 No LUYA packages registered");
        println!("💡 Register installed packages with: luya-installer rebuild");
        return Ok(());
    }

    println!("📦 Registered packages ({}):", registry.len());
    for entry in registry.entries() {
        println!(
            "  {} ({}) - {} blocks, {} bootstrap",
            entry.package.pretty_name,
            entry.package.version,
            entry.blocks.len(),
            entry.bootstrap.len()
        );
    }
    Ok(())
}

pub async fn handle_show_command(settings: &Settings, name: &str) -> Result<()> {
    let installer = settings.installer(true);
    let registry = installer.load_registry().await?;

    match registry.get(&name.to_lowercase()) {
        Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
        None => println!("❌ {} is not registered", name),
    }
    Ok(())
}

/// Handle the rebuild command - regenerate the registry from the vendor tree
pub async fn handle_rebuild_command(settings: &Settings) -> Result<()> {
    let vendor = settings.vendor_path();
    let packages = discover_packages(&vendor).await?;
    println!("🔍 Found {} LUYA packages in {}", packages.len(), vendor.display());

    let installer = settings.installer(true);
    let registry = installer.rebuild(&packages).await?;

    println!(
        "✅ Registry rebuilt with {} packages at {}",
        registry.len(),
        installer.registry_path().display()
    );
    Ok(())
}

pub fn handle_path_command(settings: &Settings) -> Result<()> {
    println!("{}", settings.installer.registry_path().display());
    Ok(())
}

pub fn handle_config_command(settings: &Settings) -> Result<()> {
    println!("{}", settings.show_all());
    Ok(())
}
