use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::LUYA_EXTRA;

/// Package types handled by the LUYA installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageType {
    #[serde(rename = "luya-core")]
    Core,
    #[serde(rename = "luya-extension")]
    Extension,
    #[serde(rename = "luya-module")]
    Module,
}

impl PackageType {
    pub const ALL: [PackageType; 3] = [
        PackageType::Core,
        PackageType::Extension,
        PackageType::Module,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Core => "luya-core",
            PackageType::Extension => "luya-extension",
            PackageType::Module => "luya-module",
        }
    }

    /// Whether `tag` names one of the supported package types.
    pub fn supports(tag: &str) -> bool {
        tag.parse::<PackageType>().is_ok()
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPackageType(pub String);

impl fmt::Display for UnknownPackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown package type '{}'", self.0)
    }
}

impl std::error::Error for UnknownPackageType {}

impl FromStr for PackageType {
    type Err = UnknownPackageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownPackageType(s.to_string()))
    }
}

/// A package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Canonical (lower-case) package name, used as the registry key.
    pub name: String,
    /// The name as written by the package author.
    pub pretty_name: String,
    pub version: String,
    pub package_type: String,
    #[serde(default)]
    pub extra: Map<String, Value>,
    /// Directory the package files are installed from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl PackageDescriptor {
    pub fn new(
        pretty_name: impl Into<String>,
        version: impl Into<String>,
        package_type: impl Into<String>,
    ) -> Self {
        let pretty_name = pretty_name.into();
        Self {
            name: pretty_name.to_lowercase(),
            pretty_name,
            version: version.into(),
            package_type: package_type.into(),
            extra: Map::new(),
            source: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn package_type(&self) -> Result<PackageType, UnknownPackageType> {
        self.package_type.parse()
    }

    /// The LUYA section of `extra`, with defaults for anything missing or malformed.
    pub fn luya_extra(&self) -> LuyaExtra {
        self.extra
            .get(LUYA_EXTRA)
            .map(LuyaExtra::from_value)
            .unwrap_or_default()
    }
}

/// Metadata a package declares under `extra.luya`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuyaExtra {
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub bootstrap: Vec<Value>,
}

impl LuyaExtra {
    /// Lenient extraction: never fails, falls back to empty lists.
    pub fn from_value(value: &Value) -> Self {
        let Some(section) = value.as_object() else {
            return Self::default();
        };

        let blocks = section
            .get("blocks")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let bootstrap = section
            .get("bootstrap")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self { blocks, bootstrap }
    }
}
