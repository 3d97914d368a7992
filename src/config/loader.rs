use std::{fs, fs::File, io::Write, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::{debug, info};

use super::ServiceConfig;

pub const ENV_PREFIX: &str = "PETPLE";

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads the service configuration from `path`.
///
/// Sources, later ones winning:
/// 1. `path` (written from the embedded default when missing)
/// 2. `<stem>.<profile>.toml` next to it, if a profile is given and the file exists
/// 3. `PETPLE_*` environment variables, `__` separating sections
pub fn load_configuration(path: &Path, profile: Option<&str>) -> Result<ServiceConfig> {
    if !path.exists() {
        write_config_to(path, get_default_config()).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let mut builder = Config::builder().add_source(config::File::from(path));

    if let Some(profile) = profile {
        let profile_path = profile_path(path, profile);
        debug!(profile = profile, path:% = profile_path.display(); "Layering profile configuration");
        builder = builder.add_source(config::File::from(profile_path).required(false));
    }

    let cfg = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
        .build()
        .context("Could not build config")?;

    cfg.try_deserialize().context("Invalid configuration")
}

/// `config/config.toml` with profile `prod` becomes `config/config.prod.toml`.
pub fn profile_path(path: &Path, profile: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("config");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("toml");
    path.with_file_name(format!("{stem}.{profile}.{extension}"))
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}
