//! Loading and saving the TOML configuration file.
//!
//! The types live in [`cf_core::config`]; this module finds the file, parses
//! it, and rejects values the pipeline cannot run with.

pub mod persist;

pub use cf_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Locations searched when no config path is given, in order.
const DEFAULT_PATHS: &[&str] = &[
    "./clipfit.toml",
    "~/.config/clipfit/config.toml",
    "/etc/clipfit/config.toml",
];

/// Load configuration from a TOML file, logging any warnings.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = read_config(path)?;
    for warning in config.warnings() {
        tracing::warn!("Config warning: {warning}");
    }
    Ok(config)
}

/// Parse and check a TOML config file without reporting warnings. Callers
/// that present [`Config::warnings`] themselves use this.
pub fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .check()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfit.toml");
        std::fs::write(
            &path,
            "[limits]\nsize_ceiling_bytes = 10000000\n\n[encoder]\nparallelism = 4\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.limits.size_ceiling_bytes, 10_000_000);
        assert_eq!(cfg.limits.max_batch_items, 10);
        assert_eq!(cfg.encoder.parallelism, 4);
        assert_eq!(cfg.encoder.preset, "fast");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfit.toml");
        std::fs::write(&path, "[limits]\nsafety_margin = 0.0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("safety_margin"), "{err:#}");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfit.toml");
        std::fs::write(&path, "[limits\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn read_config_keeps_warnings_for_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipfit.toml");
        std::fs::write(
            &path,
            "[limits]\nsize_ceiling_bytes = 2000\nmax_upload_bytes = 1000\n",
        )
        .unwrap();

        let cfg = read_config(&path).unwrap();
        assert_eq!(cfg.warnings().len(), 1);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/clipfit.toml"))).is_err());
    }
}
