//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use mingle_client::{ChatConfig, EndpointConfig};

/// `mingle-chat` arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "mingle-chat")]
#[command(about = "Terminal client for the Mingle chat service")]
pub struct Args {
    /// Base URL of the API server
    #[arg(long, env = "MINGLE_URL", default_value = "http://localhost:3000")]
    pub url: String,

    /// Access token
    #[arg(long, env = "MINGLE_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Room to join on start
    #[arg(long)]
    pub room: String,

    /// Socket.IO namespace of the chat service
    #[arg(long, default_value = "/chat")]
    pub namespace: String,

    /// Per-attempt connect timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub connect_timeout_ms: u64,

    /// Connect retries after the first attempt
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

impl Args {
    /// Connection configuration for these arguments.
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            endpoint: EndpointConfig {
                base_url: self.url.clone(),
                namespace: self.namespace.clone(),
                ..EndpointConfig::default()
            },
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            max_retries: self.max_retries,
            ..ChatConfig::default()
        }
    }
}
