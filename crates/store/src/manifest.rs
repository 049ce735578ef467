//! Reading package descriptors from `composer.json` manifests.

use std::path::Path;

use luya_types::{PackageDescriptor, PackageType};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{InstallerError, Result};

pub const MANIFEST_FILE: &str = "composer.json";

const DEFAULT_VERSION: &str = "dev-master";
const DEFAULT_TYPE: &str = "library";

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "type", default)]
    package_type: Option<String>,
    // Written as `[]` by some tools when empty, so not typed as an object
    #[serde(default)]
    extra: Value,
}

/// Parse manifest content into a descriptor. `source` is where the package lives.
pub fn parse_manifest(content: &str, source: &Path) -> Result<PackageDescriptor> {
    let manifest: PackageManifest =
        serde_json::from_str(content).map_err(|e| InstallerError::InvalidPackage {
            reason: format!("{}: {}", source.join(MANIFEST_FILE).display(), e),
        })?;

    if manifest.name.trim().is_empty() {
        return Err(InstallerError::InvalidPackage {
            reason: format!("{} has an empty name", source.join(MANIFEST_FILE).display()),
        });
    }

    let extra = match manifest.extra {
        Value::Object(map) => map,
        _ => Default::default(),
    };

    Ok(PackageDescriptor::new(
        manifest.name,
        manifest.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        manifest
            .package_type
            .unwrap_or_else(|| DEFAULT_TYPE.to_string()),
    )
    .with_extra(extra)
    .with_source(source))
}

/// Read `<dir>/composer.json` into a descriptor.
pub async fn read_manifest(dir: &Path) -> Result<PackageDescriptor> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let content = fs::read_to_string(&manifest_path)
        .await
        .map_err(|e| InstallerError::io_operation("read manifest", &manifest_path, e))?;
    parse_manifest(&content, dir)
}

/// Find installed LUYA packages at `<vendor>/<vendor-name>/<package>/composer.json`.
///
/// Unreadable manifests are skipped with a warning, other package types silently.
pub async fn discover_packages(vendor_dir: &Path) -> Result<Vec<PackageDescriptor>> {
    let mut packages = Vec::new();

    for entry in WalkDir::new(vendor_dir).min_depth(3).max_depth(3) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable vendor entry: {}", e);
                continue;
            }
        };

        if entry.file_name() != MANIFEST_FILE || !entry.file_type().is_file() {
            continue;
        }
        let Some(package_dir) = entry.path().parent() else {
            continue;
        };

        match read_manifest(package_dir).await {
            Ok(package) if PackageType::supports(&package.package_type) => {
                debug!("Discovered {} ({})", package.name, package.package_type);
                packages.push(package);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", package_dir.display(), e),
        }
    }

    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_manifest() {
        let content = json!({
            "name": "LuyaDev/luya-module-cms",
            "version": "4.0.0",
            "type": "luya-module",
            "extra": {"luya": {"blocks": ["src/frontend/blocks"], "bootstrap": ["luya\\cms\\Bootstrap"]}}
        })
        .to_string();

        let package = parse_manifest(&content, Path::new("/src/cms")).unwrap();
        assert_eq!(package.name, "luyadev/luya-module-cms");
        assert_eq!(package.pretty_name, "LuyaDev/luya-module-cms");
        assert_eq!(package.version, "4.0.0");
        assert_eq!(package.package_type, "luya-module");
        assert_eq!(package.luya_extra().blocks, vec!["src/frontend/blocks"]);
        assert_eq!(package.source.as_deref(), Some(Path::new("/src/cms")));
    }

    #[test]
    fn test_parse_manifest_defaults() {
        let package = parse_manifest(r#"{"name": "acme/lib", "extra": []}"#, Path::new(".")).unwrap();
        assert_eq!(package.version, "dev-master");
        assert_eq!(package.package_type, "library");
        assert!(package.extra.is_empty());
    }

    #[test]
    fn test_parse_manifest_rejects_bad_input() {
        assert!(matches!(
            parse_manifest(r#"{"version": "1.0.0"}"#, Path::new(".")),
            Err(InstallerError::InvalidPackage { .. })
        ));
        assert!(matches!(
            parse_manifest(r#"{"name": "  "}"#, Path::new(".")),
            Err(InstallerError::InvalidPackage { .. })
        ));
    }

    #[tokio::test]
    async fn test_discover_packages() {
        let temp_dir = TempDir::new().unwrap();
        let vendor = temp_dir.path();

        let write = |dir: &str, content: String| {
            let dir = vendor.join(dir);
            async move {
                fs::create_dir_all(&dir).await.unwrap();
                fs::write(dir.join(MANIFEST_FILE), content).await.unwrap();
            }
        };

        write(
            "zeta/module",
            json!({"name": "zeta/module", "type": "luya-module"}).to_string(),
        )
        .await;
        write(
            "acme/core",
            json!({"name": "acme/core", "type": "luya-core"}).to_string(),
        )
        .await;
        write(
            "acme/lib",
            json!({"name": "acme/lib", "type": "library"}).to_string(),
        )
        .await;
        write("broken/pkg", "{".to_string()).await;

        let packages = discover_packages(vendor).await.unwrap();
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["acme/core", "zeta/module"]);
    }
}
