//! Command-line client for the Azguard wallet.
//!
//! Reaches the wallet through the local WebSocket relay, keeps session ids in
//! `sessions.json` under the user config directory and prints one JSON result
//! envelope per invocation.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod styles;
