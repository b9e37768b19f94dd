use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::sip::SipConfig;

const LOCAL_CONFIG: &str = "ferrous-sip.toml";
const SYSTEM_CONFIG: &str = "/etc/ferrous-sip/config.toml";

/// Main configuration structure for Ferrous SIP
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Resolver, cache and upstream configuration
    #[serde(default)]
    pub dns: DnsConfig,

    /// Dialog layer and client credentials
    #[serde(default)]
    pub sip: SipConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-sip.toml in current directory
    /// 3. /etc/ferrous-sip/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG).exists() {
            Self::from_file(LOCAL_CONFIG)?
        } else if std::path::Path::new(SYSTEM_CONFIG).exists() {
            Self::from_file(SYSTEM_CONFIG)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(servers) = overrides.upstream_servers {
            self.dns.upstream_servers = servers;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.dns.query_timeout_ms = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dns.upstream_servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }

        if let Err(e) = self.dns.upstreams() {
            return Err(ConfigError::Validation(e));
        }

        if self.dns.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Query timeout cannot be 0".to_string(),
            ));
        }

        if self.dns.max_cache_entries == 0 {
            return Err(ConfigError::Validation(
                "Cache must hold at least one entry".to_string(),
            ));
        }

        if self.dns.command_queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "Command queue capacity cannot be 0".to_string(),
            ));
        }

        for credential in &self.sip.credentials {
            if credential.username.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Credential for realm '{}' has no username",
                    credential.realm
                )));
            }
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub upstream_servers: Option<Vec<String>>,
    pub query_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}
