//! Server configuration (command line flags with `TSUNAGI_*` environment fallbacks).

use std::{path::PathBuf, time::Duration};

use chrono::FixedOffset;
use clap::Parser;
use tsunagi_shared::time::parse_utc_offset;

#[derive(Parser, Debug, Clone)]
#[command(name = "tsunagi-server")]
#[command(about = "Real-time presence, room messaging and notification dispatch hub", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUNAGI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TSUNAGI_PORT", default_value = "8080")]
    pub port: u16,

    /// UTC offset used for timestamps (e.g. "+09:00", "-0500", "Z")
    #[arg(long, env = "TSUNAGI_UTC_OFFSET", default_value = "Z", value_parser = parse_utc_offset)]
    pub utc_offset: FixedOffset,

    /// FCM-style push endpoint; push is disabled when absent
    #[arg(long, env = "TSUNAGI_PUSH_ENDPOINT")]
    pub push_endpoint: Option<String>,

    /// Bearer key for the push endpoint
    #[arg(long, env = "TSUNAGI_PUSH_SERVER_KEY", hide_env_values = true)]
    pub push_server_key: Option<String>,

    /// Upper bound for a single push call, in milliseconds
    #[arg(long, env = "TSUNAGI_PUSH_TIMEOUT_MS", default_value = "5000")]
    pub push_timeout_ms: u64,

    /// Interval of the notification sweep, in seconds (0 disables the sweep)
    #[arg(long, env = "TSUNAGI_SWEEP_INTERVAL_SECS", default_value = "60")]
    pub sweep_interval_secs: u64,

    /// JSON file with rooms, assignments and scheduled events for the in-memory store
    #[arg(long, env = "TSUNAGI_FIXTURES")]
    pub fixtures: Option<PathBuf>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "TSUNAGI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }

    /// `None` when the sweep is disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Endpoint and key, only when both are configured
    pub fn push_credentials(&self) -> Option<(String, String)> {
        match (&self.push_endpoint, &self.push_server_key) {
            (Some(endpoint), Some(key)) if !endpoint.trim().is_empty() => {
                Some((endpoint.trim().to_string(), key.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしでデフォルト値が使われる
        let config = ServerConfig::try_parse_from(["tsunagi-server"]).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.push_timeout(), Duration::from_secs(5));
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.push_credentials(), None);
    }

    #[test]
    fn test_parse_flags() {
        // テスト項目: オフセット・プッシュ設定・スイープ無効化がパースされる
        let config = ServerConfig::try_parse_from([
            "tsunagi-server",
            "--utc-offset",
            "+09:00",
            "--push-endpoint",
            "http://localhost:9000/send",
            "--push-server-key",
            "secret",
            "--sweep-interval-secs",
            "0",
        ])
        .unwrap();

        assert_eq!(config.utc_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(
            config.push_credentials(),
            Some(("http://localhost:9000/send".to_string(), "secret".to_string()))
        );
        assert_eq!(config.sweep_interval(), None);
    }

    #[test]
    fn test_invalid_offset_is_rejected() {
        let result = ServerConfig::try_parse_from(["tsunagi-server", "--utc-offset", "JST"]);
        assert!(result.is_err());
    }
}
