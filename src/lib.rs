//! quarid: IRC services bot.
//!
//! One persistent client connection carries a small command framework.
//! NickBot registers nicks and logs users in with sliding sessions,
//! ChanBot registers channels and delegates operator rights, and
//! directory-based plugins add scripted commands. State lives in a redb
//! file.

pub mod authz;
pub mod bot;
pub mod client;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod plugins;
pub mod security;
pub mod services;

pub use bot::Bot;
pub use config::Config;
