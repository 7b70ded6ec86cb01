//! Chat connection configuration.

use std::time::Duration;

/// Where the chat endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Base URL of the API server (`http`, `https`, `ws` or `wss`).
    pub base_url: String,
    /// Socket.IO namespace of the chat service.
    pub namespace: String,
    /// Socket.IO handshake path on the server.
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            namespace: "/chat".to_string(),
            path: "/socket.io/".to_string(),
        }
    }
}

/// Connection manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Endpoint to connect to.
    pub endpoint: EndpointConfig,
    /// How long one connection attempt may stay silent before it is retried.
    pub connect_timeout: Duration,
    /// Retries after the first attempt times out.
    pub max_retries: u32,
    /// Idle period after the last keystroke before "stopped writing" is sent.
    pub writing_idle: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            connect_timeout: Duration::from_millis(2000),
            max_retries: 3,
            writing_idle: Duration::from_millis(1000),
        }
    }
}

impl ChatConfig {
    /// Worst-case time until a connect callback resolves when the server
    /// never answers.
    pub fn max_connect_wait(&self) -> Duration {
        self.connect_timeout * (self.max_retries + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mobile_client() {
        let config = ChatConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.writing_idle, Duration::from_secs(1));
        assert_eq!(config.max_connect_wait(), Duration::from_secs(8));
    }
}
