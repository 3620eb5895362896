//! # Structure Signals Configuration
//!
//! Configuration loading and shared defaults for the structure signals
//! services.
//!
//! ## Features
//!
//! - **Layered Loading**: optional TOML file, then `PREFIX__SECTION__KEY`
//!   environment overrides, then struct defaults for anything unset
//! - **Service Defaults**: timeouts, backoff, queue sizes, env var names
//!
//! ## Usage
//!
//! ```rust,no_run
//! use service_config::{defaults, load_layered, resolve_config_path};
//! # #[derive(serde::Deserialize, Default)]
//! # #[serde(default)]
//! # struct Settings { symbols: Vec<String> }
//!
//! let path = resolve_config_path(defaults::env::CONFIG_PATH, defaults::DEFAULT_CONFIG_PATH);
//! let settings: Settings = load_layered(
//!     &path,
//!     defaults::env::OVERRIDE_PREFIX,
//!     defaults::env::OVERRIDE_SEPARATOR,
//! )?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod service_config;

pub use service_config::{from_toml_str, load_layered, render_toml, resolve_config_path};
