pub mod structured_console_encoder;

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use log::{debug, info};
use log4rs::{
    Config,
    config::{Deserializers, RawConfig},
};

use crate::log::structured_console_encoder::StructuredConsoleEncoderDeserializer;

const LOG_CONFIG_FILE: &str = "log4rs.yml";

/// Initializes logging from `log4rs.yml` in the working directory, or from
/// the embedded defaults when that file does not exist.
pub fn init_logging() -> anyhow::Result<()> {
    let mut deserializers = Deserializers::default();
    deserializers.insert("structured_console", StructuredConsoleEncoderDeserializer);

    let path = Path::new(LOG_CONFIG_FILE);
    if path.exists() {
        log4rs::init_file(path, deserializers)
            .with_context(|| format!("Failed to load external {LOG_CONFIG_FILE}"))?;
        info!(path = LOG_CONFIG_FILE; "Logging initialized from external configuration");
        return Ok(());
    }

    let config = embedded_config(&deserializers)?;
    log4rs::init_config(config).context("Failed to initialize logging from embedded config")?;

    debug!("Logging initialized from embedded defaults (no external log4rs.yml found)");
    Ok(())
}

fn embedded_config(deserializers: &Deserializers) -> anyhow::Result<Config> {
    let yaml_content = include_str!("../../resources/default_log4rs.yml");
    let raw_config: RawConfig =
        serde_yaml::from_str(yaml_content).context("Embedded logging configuration is invalid YAML")?;

    let (appenders, errors) = raw_config.appenders_lossy(deserializers);
    if !errors.is_empty() {
        return Err(anyhow!("Errors parsing embedded appenders: {errors:?}"));
    }

    Config::builder()
        .appenders(appenders)
        .loggers(raw_config.loggers())
        .build(raw_config.root())
        .context("Failed to build logging config")
}

fn reveal_pii() -> bool {
    static REVEAL_PII_CACHE: OnceLock<bool> = OnceLock::new();

    *REVEAL_PII_CACHE.get_or_init(|| {
        std::env::var("REVEAL_PII")
            .map(|v| {
                let val = v.to_lowercase();
                val == "true" || val == "1"
            })
            .unwrap_or(false)
    })
}

/// Masks a secret (like an API key) showing only the first and last four characters.
/// If REVEAL_PII is true, returns the original string.
pub fn mask_string(s: &str) -> String {
    if reveal_pii() {
        return s.to_string();
    }

    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let mut deserializers = Deserializers::default();
        deserializers.insert("structured_console", StructuredConsoleEncoderDeserializer);
        assert!(embedded_config(&deserializers).is_ok());
    }

    #[test]
    fn test_mask_string() {
        if reveal_pii() {
            return;
        }
        assert_eq!(mask_string("sample"), "***");
        assert_eq!(mask_string("4d6f6b65794b6579"), "4d6f...6579");
        assert_eq!(mask_string("가나다라마바사아자차"), "가나다라...사아자차");
    }
}
