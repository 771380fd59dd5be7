//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connection and identity.
    pub irc: IrcConfig,
    /// Command prefixes and session policy.
    #[serde(default)]
    pub services: ServicesConfig,
    /// Persistent store location.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Script plugins.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Server connection and bot identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// `host:port` of the IRC server.
    pub server: String,
    /// Desired nickname.
    pub nick: String,
    /// Ident; falls back to the nick when unset.
    pub ident: Option<String>,
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Channels joined after registration.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Global-operator hostmasks (`nick!user@host`, wildcards allowed).
    /// Matching identities bypass per-channel role checks.
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Give up after this many consecutive nickname collisions.
    /// Unset retries forever.
    pub nick_retry_limit: Option<u32>,
    #[serde(default)]
    pub tls: TlsConfig,
    /// Sent as `OPER name password` once registered.
    pub oper: Option<OperCredentials>,
}

impl IrcConfig {
    pub fn ident(&self) -> &str {
        self.ident.as_deref().unwrap_or(&self.nick)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Host part of `server`, used for TLS server name verification.
    pub fn host(&self) -> &str {
        match self.server.rsplit_once(':') {
            Some((host, _)) => host.trim_start_matches('[').trim_end_matches(']'),
            None => &self.server,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Verify the server certificate against the system roots.
    #[serde(default = "default_true")]
    pub verify: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verify: default_true(),
        }
    }
}

/// IRC operator credentials.
#[derive(Clone, Deserialize)]
pub struct OperCredentials {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for OperCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperCredentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_prefix")]
    pub nickbot_prefix: String,
    #[serde(default = "default_prefix")]
    pub chanbot_prefix: String,
    /// Sliding session window in seconds (default: 3600).
    #[serde(default = "default_session_window_secs")]
    pub session_window_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            nickbot_prefix: default_prefix(),
            chanbot_prefix: default_prefix(),
            session_window_secs: default_session_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginsConfig {
    /// Directories whose sub-directories are loaded as plugins.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    #[serde(default = "default_plugin_prefix")]
    pub prefix: String,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            prefix: default_plugin_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = Config::parse(
            r#"
            [irc]
            server = "irc.example.net:6667"
            nick = "quarid"
            "#,
        )
        .unwrap();

        assert_eq!(config.irc.ident(), "quarid");
        assert_eq!(config.irc.realname, "Quarid IRC Services");
        assert_eq!(config.irc.connect_timeout(), Duration::from_secs(60));
        assert!(config.irc.nick_retry_limit.is_none());
        assert!(!config.irc.tls.enabled);
        assert!(config.irc.tls.verify);
        assert!(config.irc.oper.is_none());
        assert_eq!(config.services.nickbot_prefix, "!");
        assert_eq!(config.services.chanbot_prefix, "!");
        assert_eq!(config.services.session_window_secs, 3600);
        assert_eq!(config.database.path, PathBuf::from("quarid.redb"));
        assert!(config.plugins.dirs.is_empty());
        assert_eq!(config.plugins.prefix, "@");
    }

    #[test]
    fn full_config_parses() {
        let config = Config::parse(
            r##"
            [irc]
            server = "irc.example.net:6697"
            nick = "quarid"
            ident = "qd"
            channels = ["#chat", "#ops"]
            admins = ["*!*@admin.example.net"]
            nick_retry_limit = 5

            [irc.tls]
            enabled = true
            verify = false

            [irc.oper]
            name = "services"
            password = "hunter2"

            [services]
            nickbot_prefix = "#"
            session_window_secs = 600

            [database]
            path = "/var/lib/quarid/db.redb"

            [plugins]
            dirs = ["plugins"]
            "##,
        )
        .unwrap();

        assert_eq!(config.irc.ident(), "qd");
        assert_eq!(config.irc.host(), "irc.example.net");
        assert_eq!(config.irc.channels, vec!["#chat", "#ops"]);
        assert_eq!(config.irc.nick_retry_limit, Some(5));
        assert!(config.irc.tls.enabled && !config.irc.tls.verify);
        let oper = config.irc.oper.as_ref().unwrap();
        assert_eq!(oper.name, "services");
        assert!(!format!("{oper:?}").contains("hunter2"));
        assert_eq!(config.services.nickbot_prefix, "#");
        assert_eq!(config.services.chanbot_prefix, "!");
        assert_eq!(config.services.session_window_secs, 600);
        assert_eq!(config.plugins.dirs, vec![PathBuf::from("plugins")]);
    }

    #[test]
    fn missing_irc_section_is_a_parse_error() {
        assert!(matches!(
            Config::parse("[services]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/quarid.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn ipv6_host_is_unbracketed() {
        let config = Config::parse(
            r#"
            [irc]
            server = "[::1]:6667"
            nick = "q"
            "#,
        )
        .unwrap();
        assert_eq!(config.irc.host(), "::1");
    }
}
