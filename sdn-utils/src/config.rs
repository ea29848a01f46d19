//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Shared configuration defaults.

use std::time::Duration;

/// TLS key material locations, shared shape for both the server and the
/// client sides.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
    pub ca_file: Option<String>,
    /// Development mode disables hostname and peer-certificate
    /// verification.
    pub dev_mode: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            cert_file: "certs/server.crt".to_owned(),
            key_file: "certs/server.key".to_owned(),
            ca_file: None,
            dev_mode: true,
        }
    }
}

/// Timer and endpoint defaults shared by the Controller and Router agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub bind_port: u16,
    pub hello_interval: Duration,
    pub dead_interval: Duration,
    pub heartbeat_interval_server: Duration,
    pub heartbeat_interval_client: Duration,
    pub reconnect_interval: Duration,
    pub tls: TlsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_host: "0.0.0.0".to_owned(),
            bind_port: 6633,
            hello_interval: Duration::from_secs(10),
            dead_interval: Duration::from_secs(40),
            heartbeat_interval_server: Duration::from_secs(10),
            heartbeat_interval_client: Duration::from_secs(20),
            reconnect_interval: Duration::from_secs(5),
            tls: TlsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.bind_port, 6633);
        assert_eq!(config.hello_interval, Duration::from_secs(10));
        assert_eq!(config.dead_interval, Duration::from_secs(40));
        assert_eq!(config.heartbeat_interval_server, Duration::from_secs(10));
        assert_eq!(config.heartbeat_interval_client, Duration::from_secs(20));
        assert_eq!(config.reconnect_interval, Duration::from_secs(5));
    }
}
