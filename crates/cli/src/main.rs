mod cli;
mod commands;
mod config;

use clap::Parser;

use crate::cli::Commands;
use crate::commands::{
    handle_config_command, handle_install_command, handle_list_command, handle_path_command,
    handle_rebuild_command, handle_show_command, handle_supports_command,
    handle_uninstall_command, handle_update_command,
};
use crate::config::Settings;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Needs no project
    let settings = match &cli.command {
        Commands::Supports { package_type } => return handle_supports_command(package_type),
        _ => Settings::from_cli(&cli).await?,
    };

    match cli.command {
        Commands::Supports { .. } => {}
        Commands::Install {
            package_dir,
            package_version,
            registry_only,
        } => {
            handle_install_command(&settings, package_dir, package_version, registry_only).await?;
        }
        Commands::Update {
            package_dir,
            package_version,
            registry_only,
        } => {
            handle_update_command(&settings, package_dir, package_version, registry_only).await?;
        }
        Commands::Uninstall {
            name,
            registry_only,
        } => {
            handle_uninstall_command(&settings, name, registry_only).await?;
        }
        Commands::List => handle_list_command(&settings).await?,
        Commands::Show { name } => handle_show_command(&settings, &name).await?,
        Commands::Rebuild => handle_rebuild_command(&settings).await?,
        Commands::Path => handle_path_command(&settings)?,
        Commands::Config => handle_config_command(&settings)?,
    }

    Ok(())
}
