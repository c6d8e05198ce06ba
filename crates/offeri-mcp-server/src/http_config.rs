// ABOUTME: HTTP transport settings for the OfferI MCP server
// ABOUTME: Host, port and SSE keep-alive, derived from the [server] config section plus CLI flags

use offeri_core::ServerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host address to bind to (default: "127.0.0.1")
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// SSE keep-alive interval in seconds (default: 15)
    pub keep_alive_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            keep_alive_seconds: 15,
        }
    }
}

impl From<&ServerConfig> for HttpServerConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.http_host.clone(),
            port: server.http_port,
            keep_alive_seconds: server.keep_alive_seconds,
        }
    }
}

impl HttpServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Command-line flags win over whatever the config layer produced.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = HttpServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            keep_alive_seconds: 30,
        };
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn converts_from_server_section() {
        let server = ServerConfig {
            http_host: "10.0.0.2".to_string(),
            http_port: 4100,
            keep_alive_seconds: 20,
        };
        let config = HttpServerConfig::from(&server).with_overrides(None, Some(4200));
        assert_eq!(config.bind_address(), "10.0.0.2:4200");
        assert_eq!(config.keep_alive_seconds, 20);
    }
}
