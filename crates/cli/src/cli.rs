use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(name = "luya-installer", version, about = "Maintain the LUYA package registry")]
pub struct Cli {
    /// Project root containing composer.json
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Vendor directory, overriding composer.json and COMPOSER_VENDOR_DIR
    #[arg(long, global = true)]
    pub vendor_dir: Option<String>,

    /// Fail when the registry file cannot be written
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Check whether a package type is handled by this installer
    Supports {
        /// Package type, e.g. luya-module
        package_type: String,
    },
    /// Install a package from a directory containing composer.json
    Install {
        package_dir: PathBuf,
        /// Override the version from the manifest
        #[arg(long)]
        package_version: Option<String>,
        /// Only update the registry, leave the vendor tree alone
        #[arg(long)]
        registry_only: bool,
    },
    /// Update an installed package from a directory containing composer.json
    Update {
        package_dir: PathBuf,
        /// Override the version from the manifest
        #[arg(long)]
        package_version: Option<String>,
        /// Only update the registry, leave the vendor tree alone
        #[arg(long)]
        registry_only: bool,
    },
    /// Uninstall a package by name
    Uninstall {
        name: String,
        /// Only update the registry, leave the vendor tree alone
        #[arg(long)]
        registry_only: bool,
    },
    /// List registered packages
    List,
    /// Show the registry entry of a package
    Show { name: String },
    /// Regenerate the registry from the packages in the vendor directory
    Rebuild,
    /// Print the location of the registry file
    Path,
    /// Show the resolved configuration
    Config,
}
