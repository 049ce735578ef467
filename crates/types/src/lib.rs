//! Shared data model for the LUYA package registry.
//!
//! The types in this crate describe what the package manager hands to the
//! installer ([`PackageDescriptor`]) and what ends up in the generated
//! registry file ([`Registry`], [`PackageEntry`]).

pub mod package;
pub mod registry;

pub use package::{LuyaExtra, PackageDescriptor, PackageType, UnknownPackageType};
pub use registry::{PackageEntry, PackageInfo, Registry};

/// Key under `extra` in a package manifest that holds LUYA metadata.
pub const LUYA_EXTRA: &str = "luya";

/// Location of the registry file, relative to the vendor directory.
pub const REGISTRY_FILE: &str = "luyadev/installer.json";

/// Token that stands for the vendor root inside a written registry file.
pub const VENDOR_DIR_PLACEHOLDER: &str = "<vendor-dir>";
