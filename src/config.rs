//! Configuration handling for ovpn-fulltunnel
//!
//! The routing constants (table id, firewall mark, rule priority) default to
//! values unlikely to collide with other policy-routing users on the same
//! host, but they are plain config fields so a collision can be resolved
//! without rebuilding.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the VPN client config and the generated hook scripts.
    pub client_dir: PathBuf,
    /// System route-table registry.
    pub rt_tables: PathBuf,
    /// Where the record of the last setup run is kept.
    pub state_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Numeric id of the dedicated routing table.
    pub table_id: u32,
    /// Name registered for the table in rt_tables.
    pub table_name: String,
    /// Firewall mark applied to inbound traffic on the physical interface.
    /// 0x100 stays clear of the small marks most tools hand out.
    pub fwmark: u32,
    /// Priority of the `ip rule` directing marked traffic to the table.
    pub rule_priority: u32,
    /// Public address probed with `ip route get` to discover the default path.
    pub probe_address: String,
    /// Seconds the up-script sleeps before touching routing state.
    pub up_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                client_dir: PathBuf::from("/etc/openvpn/client"),
                rt_tables: PathBuf::from("/etc/iproute2/rt_tables"),
                state_file: PathBuf::from("/var/run/ovpn-fulltunnel.json"),
            },
            routing: RoutingConfig {
                table_id: 100,
                table_name: "main_route".to_string(),
                fwmark: 0x100,
                rule_priority: 100,
                probe_address: "1.1.1.1".to_string(),
                up_delay_secs: 2,
            },
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from an explicit path, then `/etc/ovpn-fulltunnel.toml`, then
    /// fall back to the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let system_config = Path::new("/etc/ovpn-fulltunnel.toml");
        if system_config.exists() {
            return Self::load(system_config);
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_routing_constants() {
        let config = Config::default();
        assert_eq!(config.routing.table_id, 100);
        assert_eq!(config.routing.table_name, "main_route");
        assert_eq!(config.routing.fwmark, 0x100);
        assert_eq!(config.routing.rule_priority, 100);
        assert_eq!(
            config.paths.client_dir,
            PathBuf::from("/etc/openvpn/client")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.routing.fwmark = 0x200;
        config.routing.table_name = "alt_route".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.routing.fwmark, 0x200);
        assert_eq!(loaded.routing.table_name, "alt_route");
        assert_eq!(loaded.routing.probe_address, "1.1.1.1");
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
