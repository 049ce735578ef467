use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::package::PackageDescriptor;

/// Snapshot of the package identity at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    #[serde(rename = "prettyName")]
    pub pretty_name: String,
    pub version: String,
}

impl From<&PackageDescriptor> for PackageInfo {
    fn from(package: &PackageDescriptor) -> Self {
        Self {
            name: package.name.clone(),
            pretty_name: package.pretty_name.clone(),
            version: package.version.clone(),
        }
    }
}

/// What a single package contributes to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub package: PackageInfo,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub bootstrap: Vec<Value>,
}

/// The generated registry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub configs: IndexMap<String, PackageEntry>,
    /// Unix seconds of the last load or write. Advisory only.
    #[serde(default = "now")]
    pub timestamp: i64,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            configs: IndexMap::new(),
            timestamp: now(),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self) {
        self.timestamp = Utc::now().timestamp();
    }

    /// Insert or overwrite the entry keyed by its package name.
    pub fn insert(&mut self, entry: PackageEntry) -> Option<PackageEntry> {
        self.configs.insert(entry.package.name.clone(), entry)
    }

    /// Remove the entry for `name`, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<PackageEntry> {
        self.configs.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.configs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PackageEntry> {
        self.configs.values()
    }

    /// Replace block paths for which `rewrite` returns a new value.
    pub fn rewrite_blocks<F>(&mut self, mut rewrite: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for entry in self.configs.values_mut() {
            for block in entry.blocks.iter_mut() {
                if let Some(replaced) = rewrite(block) {
                    *block = replaced;
                }
            }
        }
    }
}
