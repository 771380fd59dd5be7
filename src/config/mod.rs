//! Configuration loading and management.
//!
//! - [`types`]: the TOML-facing structs and [`Config::load`]
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that collect every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{
    Config, ConfigError, DatabaseConfig, IrcConfig, OperCredentials, PluginsConfig,
    ServicesConfig, TlsConfig,
};
pub use validation::{ValidationError, validate};
