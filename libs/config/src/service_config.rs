//! Service Configuration Module
//!
//! Loads a service's settings struct from an optional TOML file, then applies
//! `PREFIX__SECTION__KEY` environment overrides on top.
//!
//! Settings structs are expected to carry `#[serde(default)]` so that any key
//! missing from both sources falls back to the struct's `Default`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolve a config file path from `env_var`, falling back to `default`
pub fn resolve_config_path(env_var: &str, default: &str) -> PathBuf {
    match std::env::var(env_var) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(default),
    }
}

/// Load `T` from `path` (if it exists) with environment overrides.
///
/// A missing file is not an error: the struct's defaults are used, still
/// subject to environment overrides.
pub fn load_layered<T>(path: &Path, env_prefix: &str, separator: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();

    if path.exists() {
        info!("Loading configuration from {:?}", path);
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    } else {
        warn!("Config file {:?} not found, using defaults", path);
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator(separator)
            .separator(separator)
            .try_parsing(true),
    );

    let config = builder
        .build()
        .with_context(|| format!("Failed to build configuration from {:?}", path))?;

    let settings = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    debug!("Configuration loaded (prefix {})", env_prefix);
    Ok(settings)
}

/// Parse settings from an in-memory TOML document without env overrides
pub fn from_toml_str<T>(content: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    toml::from_str(content).context("Failed to parse TOML configuration")
}

/// Render effective settings back to TOML for logging
pub fn render_toml<T>(settings: &T) -> Result<String>
where
    T: Serialize,
{
    toml::to_string_pretty(settings).context("Failed to render configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        retries: u32,
        nested: Nested,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    #[serde(default)]
    struct Nested {
        period: u32,
        enabled: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                retries: 3,
                nested: Nested::default(),
            }
        }
    }

    impl Default for Nested {
        fn default() -> Self {
            Self {
                period: 14,
                enabled: true,
            }
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let sample: Sample = load_layered(&path, "SVC_CFG_TEST_MISSING", "__").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_load_file_with_partial_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("service.toml");

        let content = r#"
name = "from-file"

[nested]
period = 21
"#;
        fs::write(&path, content).unwrap();

        let sample: Sample = load_layered(&path, "SVC_CFG_TEST_FILE", "__").unwrap();
        assert_eq!(sample.name, "from-file");
        assert_eq!(sample.retries, 3);
        assert_eq!(sample.nested.period, 21);
        assert!(sample.nested.enabled);
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "retries = 1\n").unwrap();

        std::env::set_var("SVC_CFG_TEST_ENV__RETRIES", "9");
        std::env::set_var("SVC_CFG_TEST_ENV__NESTED__ENABLED", "false");

        let sample: Sample = load_layered(&path, "SVC_CFG_TEST_ENV", "__").unwrap();

        std::env::remove_var("SVC_CFG_TEST_ENV__RETRIES");
        std::env::remove_var("SVC_CFG_TEST_ENV__NESTED__ENABLED");

        assert_eq!(sample.retries, 9);
        assert!(!sample.nested.enabled);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "retries = [not toml").unwrap();

        let result: Result<Sample> = load_layered(&path, "SVC_CFG_TEST_BROKEN", "__");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_config_path() {
        std::env::remove_var("SVC_CFG_TEST_PATH");
        assert_eq!(
            resolve_config_path("SVC_CFG_TEST_PATH", "configs/a.toml"),
            PathBuf::from("configs/a.toml")
        );

        std::env::set_var("SVC_CFG_TEST_PATH", "/etc/b.toml");
        assert_eq!(
            resolve_config_path("SVC_CFG_TEST_PATH", "configs/a.toml"),
            PathBuf::from("/etc/b.toml")
        );
        std::env::remove_var("SVC_CFG_TEST_PATH");
    }

    #[test]
    fn test_render_round_trips_through_toml() {
        let rendered = render_toml(&Sample::default()).unwrap();
        let parsed: Sample = from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, Sample::default());
    }
}
