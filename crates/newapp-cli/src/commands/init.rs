//! `newapp init` - create a default configuration file.

use std::path::PathBuf;

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Create a newapp configuration file.
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    _config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    output.info("Initialising configuration...")?;

    let config_path = if args.local {
        PathBuf::from(LOCAL_CONFIG_FILE)
    } else {
        AppConfig::active_path(global.config.as_deref())
    };

    if config_path.exists() && !args.force {
        return Err(CliError::ConfigExists { path: config_path });
    }

    let mut initial = AppConfig::default();
    if args.interactive {
        prompt_defaults(&mut initial)?;
    }

    let toml = toml::to_string_pretty(&initial).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CliError::IoError {
                message: format!("Failed to create config directory '{}'", parent.display()),
                source: e,
            })?;
        }
    }

    std::fs::write(&config_path, &toml).map_err(|e| CliError::IoError {
        message: format!("Failed to write config to '{}'", config_path.display()),
        source: e,
    })?;

    output.success(&format!("Configuration created at {}", config_path.display()))?;
    Ok(())
}

#[cfg(feature = "interactive")]
fn prompt_defaults(config: &mut AppConfig) -> CliResult<()> {
    use dialoguer::{Confirm, Select, theme::ColorfulTheme};

    let theme = ColorfulTheme::default();
    let strategies = ["detect", "source", "docker"];
    let picked = Select::with_theme(&theme)
        .with_prompt("Default build strategy")
        .items(&strategies)
        .default(0)
        .interact()
        .map_err(|_| CliError::Cancelled)?;
    config.defaults.strategy = (picked > 0).then(|| strategies[picked].to_string());

    config.defaults.insecure_registry = Confirm::with_theme(&theme)
        .with_prompt("Allow images from insecure registries?")
        .default(false)
        .interact()
        .map_err(|_| CliError::Cancelled)?;

    config.defaults.allow_missing_images = Confirm::with_theme(&theme)
        .with_prompt("Use images that cannot be found as given?")
        .default(false)
        .interact()
        .map_err(|_| CliError::Cancelled)?;
    Ok(())
}

#[cfg(not(feature = "interactive"))]
fn prompt_defaults(_config: &mut AppConfig) -> CliResult<()> {
    Err(CliError::FeatureNotAvailable {
        feature: "interactive",
    })
}
