//! Install / update / uninstall flows against a real vendor tree

use std::path::{Path, PathBuf};
use std::sync::Arc;

use luya_store::{
    BufferIo, Installer, InstallerConfig, InstallerError, NoopLibraryInstaller, RegistryCache,
    VendorLibraryInstaller, discover_packages, read_manifest,
};
use luya_types::PackageDescriptor;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::fs;

fn registry_only(project: &Path) -> Installer {
    Installer::new(InstallerConfig::new(project), Box::new(NoopLibraryInstaller))
}

fn package(name: &str, pretty_name: &str, version: &str, extra: Value) -> PackageDescriptor {
    PackageDescriptor::new(pretty_name, version, "luya-module")
        .with_name(name)
        .with_extra(extra.as_object().cloned().unwrap_or_default())
}

async fn read_raw(installer: &Installer) -> Value {
    let content = fs::read_to_string(installer.registry_path()).await.unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_first_install_creates_registry() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());
    assert!(!installer.registry_path().exists());

    let vendor_a = package(
        "vendor/a",
        "Vendor A",
        "1.0.0",
        json!({"luya": {"blocks": ["widgets"]}}),
    );
    installer.install(&vendor_a).await.unwrap();

    assert!(installer.registry_path().exists());
    let raw = read_raw(&installer).await;
    assert_eq!(
        raw["configs"]["vendor/a"]["blocks"],
        json!(["vendor/Vendor A/widgets"])
    );
    assert_eq!(
        raw["configs"]["vendor/a"]["package"],
        json!({"name": "vendor/a", "prettyName": "Vendor A", "version": "1.0.0"})
    );
    assert_eq!(raw["configs"]["vendor/a"]["bootstrap"], json!([]));
    assert!(raw["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_install_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());
    let pkg = package(
        "acme/blog",
        "acme/blog",
        "2.1.0",
        json!({"luya": {"blocks": ["/src/blocks"], "bootstrap": ["acme\\blog\\Bootstrap"]}}),
    );

    installer.install(&pkg).await.unwrap();
    let first = installer.load_registry().await.unwrap();

    installer.install(&pkg).await.unwrap();
    let second = installer.load_registry().await.unwrap();

    assert_eq!(first.configs, second.configs);
    assert_eq!(second.len(), 1);
    assert_eq!(
        second.get("acme/blog").unwrap().blocks,
        vec!["vendor/acme/blog/src/blocks"]
    );
}

#[tokio::test]
async fn test_uninstall_unknown_package_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    let kept = package("acme/kept", "acme/kept", "1.0.0", json!({}));
    installer.install(&kept).await.unwrap();
    let before = installer.load_registry().await.unwrap();

    let ghost = package("acme/ghost", "acme/ghost", "1.0.0", json!({}));
    installer.uninstall(&ghost).await.unwrap();

    let after = installer.load_registry().await.unwrap();
    assert_eq!(before.configs, after.configs);
}

#[tokio::test]
async fn test_update_replaces_entry() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    let old = package(
        "acme/cms",
        "acme/cms",
        "1.0.0",
        json!({"luya": {"blocks": ["old-blocks"]}}),
    );
    let new = package(
        "acme/cms",
        "acme/cms",
        "2.0.0",
        json!({"luya": {"blocks": ["new-blocks"], "bootstrap": ["acme\\cms\\Bootstrap"]}}),
    );

    installer.install(&old).await.unwrap();
    installer.update(&old, &new).await.unwrap();

    let registry = installer.load_registry().await.unwrap();
    assert_eq!(registry.len(), 1);

    let entry = registry.get("acme/cms").unwrap();
    assert_eq!(entry.package.version, "2.0.0");
    assert_eq!(entry.blocks, vec!["vendor/acme/cms/new-blocks"]);
    assert_eq!(entry.bootstrap, vec![json!("acme\\cms\\Bootstrap")]);
}

#[tokio::test]
async fn test_update_with_renamed_package_drops_old_entry() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    let old = package("acme/old-name", "acme/old-name", "1.0.0", json!({}));
    let new = package("acme/new-name", "acme/new-name", "1.0.0", json!({}));

    installer.install(&old).await.unwrap();
    installer.update(&old, &new).await.unwrap();

    let registry = installer.load_registry().await.unwrap();
    assert!(!registry.contains("acme/old-name"));
    assert!(registry.contains("acme/new-name"));
}

#[tokio::test]
async fn test_uninstall_first_of_two() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    let first = package("acme/first", "acme/first", "1.0.0", json!({}));
    let second = package(
        "acme/second",
        "acme/second",
        "1.0.0",
        json!({"luya": {"blocks": ["blocks"]}}),
    );

    installer.install(&first).await.unwrap();
    installer.install(&second).await.unwrap();
    installer.uninstall(&first).await.unwrap();

    let registry = installer.load_registry().await.unwrap();
    let names: Vec<_> = registry.configs.keys().cloned().collect();
    assert_eq!(names, vec!["acme/second"]);
}

#[tokio::test]
async fn test_corrupt_registry_aborts_and_is_left_alone() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    fs::create_dir_all(installer.registry_path().parent().unwrap())
        .await
        .unwrap();
    fs::write(installer.registry_path(), "{\"configs\": [broken")
        .await
        .unwrap();

    let pkg = package("acme/blog", "acme/blog", "1.0.0", json!({}));
    let err = installer.install(&pkg).await.unwrap_err();
    assert!(matches!(err, InstallerError::CorruptedRegistry { .. }));

    let content = fs::read_to_string(installer.registry_path()).await.unwrap();
    assert_eq!(content, "{\"configs\": [broken");

    // A rebuild recovers from it
    installer.rebuild(&[pkg]).await.unwrap();
    let registry = installer.load_registry().await.unwrap();
    assert!(registry.contains("acme/blog"));
}

#[tokio::test]
async fn test_host_cache_sees_every_write() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(RegistryCache::new());
    let installer = registry_only(temp_dir.path()).with_invalidator(cache.clone());
    let path = installer.registry_path().to_path_buf();

    installer
        .install(&package("acme/a", "acme/a", "1.0.0", json!({})))
        .await
        .unwrap();
    assert_eq!(cache.get(&path).await.unwrap().len(), 1);

    installer
        .install(&package("acme/b", "acme/b", "1.0.0", json!({})))
        .await
        .unwrap();
    assert_eq!(cache.get(&path).await.unwrap().len(), 2);

    installer
        .uninstall(&package("acme/a", "acme/a", "1.0.0", json!({})))
        .await
        .unwrap();
    let registry = cache.get(&path).await.unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.contains("acme/b"));
}

#[tokio::test]
async fn test_rebuild_skips_unsupported_types() {
    let temp_dir = TempDir::new().unwrap();
    let installer = registry_only(temp_dir.path());

    let module = package("acme/module", "acme/module", "1.0.0", json!({}));
    let library = PackageDescriptor::new("acme/lib", "1.0.0", "library");

    let registry = installer.rebuild(&[module, library]).await.unwrap();
    assert_eq!(registry.len(), 1);
    assert!(installer.load_registry().await.unwrap().contains("acme/module"));
}

async fn write_package_source(root: &Path, manifest: Value) -> PathBuf {
    let name = manifest["name"].as_str().unwrap().replace('/', "-");
    let source = root.join("sources").join(name);
    fs::create_dir_all(source.join("src/blocks")).await.unwrap();
    fs::write(source.join("composer.json"), manifest.to_string())
        .await
        .unwrap();
    fs::write(source.join("src/blocks/HeroBlock.php"), "<?php")
        .await
        .unwrap();
    source
}

#[tokio::test]
async fn test_vendor_install_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");
    fs::create_dir_all(&project).await.unwrap();

    let config = InstallerConfig::new(&project);
    let io = Arc::new(BufferIo::new());
    let installer = Installer::new(
        config.clone(),
        Box::new(VendorLibraryInstaller::new(config.vendor_path())),
    )
    .with_io(io.clone());

    let source = write_package_source(
        temp_dir.path(),
        json!({
            "name": "acme/luya-module-hero",
            "version": "1.2.0",
            "type": "luya-module",
            "extra": {"luya": {"blocks": ["src/blocks"]}}
        }),
    )
    .await;

    let pkg = read_manifest(&source).await.unwrap();
    installer.install(&pkg).await.unwrap();

    let vendor = config.vendor_path();
    assert!(vendor.join("acme/luya-module-hero/src/blocks/HeroBlock.php").exists());

    let entry = installer
        .load_registry()
        .await
        .unwrap()
        .get("acme/luya-module-hero")
        .cloned()
        .unwrap();
    assert_eq!(entry.blocks, vec!["vendor/acme/luya-module-hero/src/blocks"]);

    // Every registered block folder exists relative to the project
    for block in &entry.blocks {
        assert!(project.join(block).is_dir());
    }

    // The vendor tree can be scanned back into the same registry
    let discovered = discover_packages(&vendor).await.unwrap();
    assert_eq!(discovered.len(), 1);
    let rebuilt = installer.rebuild(&discovered).await.unwrap();
    assert_eq!(rebuilt.get("acme/luya-module-hero").unwrap().blocks, entry.blocks);

    installer.uninstall(&pkg).await.unwrap();
    assert!(!vendor.join("acme/luya-module-hero").exists());
    assert!(installer.load_registry().await.unwrap().is_empty());
    assert!(io.lines().is_empty());
}

#[tokio::test]
async fn test_failed_physical_install_leaves_registry_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let config = InstallerConfig::new(temp_dir.path());
    let installer = Installer::new(
        config.clone(),
        Box::new(VendorLibraryInstaller::new(config.vendor_path())),
    );

    // No source directory to copy from
    let pkg = package("acme/blog", "acme/blog", "1.0.0", json!({}));
    assert!(installer.install(&pkg).await.is_err());
    assert!(!installer.registry_path().exists());
}
