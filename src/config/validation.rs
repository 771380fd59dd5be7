//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use quarid_proto::{ChannelExt, HostMask};
use thiserror::Error;

use super::Config;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("irc.server must be host:port, got '{0}'")]
    InvalidServer(String),
    #[error("irc.nick is required")]
    MissingNick,
    #[error("irc.channels entry is not a channel: '{0}'")]
    InvalidChannel(String),
    #[error("irc.admins entry is not a hostmask: '{0}'")]
    InvalidAdminMask(String),
    #[error("{0} prefix must not be empty or contain spaces")]
    InvalidPrefix(&'static str),
    #[error("services.session_window_secs must be greater than zero")]
    ZeroSessionWindow,
    #[error("irc.connect_timeout_secs must be greater than zero")]
    ZeroConnectTimeout,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let irc = &config.irc;

    let port_ok = irc
        .server
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !port_ok {
        errors.push(ValidationError::InvalidServer(irc.server.clone()));
    }

    if irc.nick.trim().is_empty() {
        errors.push(ValidationError::MissingNick);
    }

    for channel in &irc.channels {
        if !channel.is_valid_channel() {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    for mask in &irc.admins {
        if HostMask::parse(mask).is_err() {
            errors.push(ValidationError::InvalidAdminMask(mask.clone()));
        }
    }

    let prefixes = [
        ("services.nickbot", &config.services.nickbot_prefix),
        ("services.chanbot", &config.services.chanbot_prefix),
        ("plugins", &config.plugins.prefix),
    ];
    for (name, prefix) in prefixes {
        if prefix.is_empty() || prefix.contains(char::is_whitespace) {
            errors.push(ValidationError::InvalidPrefix(name));
        }
    }

    if config.services.session_window_secs == 0 {
        errors.push(ValidationError::ZeroSessionWindow);
    }
    if irc.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
