//! Integration test common infrastructure.
//!
//! A scripted IRC server on a loopback port, plus helpers to point a
//! [`quarid::Bot`] at it.

pub mod server;

#[allow(unused_imports)]
pub use server::{MockServer, Peer};

use quarid::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Bot config aimed at `addr`, storing its database under `dir`.
#[allow(dead_code)]
pub fn config(addr: SocketAddr, dir: &Path, extra: &str) -> Config {
    let toml = format!(
        r#"
        [irc]
        server = "{addr}"
        nick = "quarid"
        realname = "Quarid Test"
        connect_timeout_secs = 5
        {extra}

        [database]
        path = "{db}"
        "#,
        db = dir.join("quarid.redb").display(),
    );
    Config::parse(&toml).expect("test config parses")
}
