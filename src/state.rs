//! Persistent record of the last setup run
//!
//! Saved at the end of a successful pipeline so `status` can report what was
//! configured without re-probing the network or re-reading the VPN config.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupState {
    /// Service identifier derived from the config filename.
    pub service: String,
    /// Path of the ingested VPN client config.
    pub config_path: PathBuf,
    /// Gateway detected at setup time.
    pub gateway: Ipv4Addr,
    /// Physical interface detected at setup time.
    pub interface: String,
    pub up_script: PathBuf,
    pub down_script: PathBuf,
}

impl SetupState {
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the saved state, or `None` if no setup has been recorded.
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    pub fn delete(path: &Path) -> Result<(), StateError> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> SetupState {
        SetupState {
            service: "office".to_string(),
            config_path: PathBuf::from("/etc/openvpn/client/office.ovpn"),
            gateway: "192.168.1.1".parse().unwrap(),
            interface: "eth0".to_string(),
            up_script: PathBuf::from("/etc/openvpn/client/route-up.sh"),
            down_script: PathBuf::from("/etc/openvpn/client/route-down.sh"),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        sample_state().save(&path).unwrap();
        let loaded = SetupState::load(&path).unwrap().unwrap();

        assert_eq!(loaded.service, "office");
        assert_eq!(loaded.gateway.to_string(), "192.168.1.1");
        assert_eq!(loaded.interface, "eth0");
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        assert!(SetupState::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_state() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = SetupState::load(&path);
        assert!(matches!(result, Err(StateError::Parse(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        sample_state().save(&path).unwrap();
        SetupState::delete(&path).unwrap();
        assert!(!path.exists());

        // Second delete on a missing file is fine.
        SetupState::delete(&path).unwrap();
    }
}
