//! ovpn-fulltunnel - Policy-routed full-tunnel OpenVPN setup
//!
//! This crate configures a Linux host so that all outbound traffic is forced
//! through an OpenVPN tunnel while the administrator's existing SSH session
//! keeps working. Inbound connections on the physical interface are marked
//! with a firewall mark, and a dedicated routing table sends their replies
//! back out the original gateway instead of into the tunnel.
//!
//! # Architecture
//!
//! - `config`: Configuration file handling (TOML)
//! - `preflight`: Privilege and external-dependency checks
//! - `netinfo`: Default gateway and interface detection
//! - `setup`: The setup pipeline (ingestion, rt_tables, hooks, config rewrite)
//! - `state`: Persistent record of the last setup run
//!
//! # Usage
//!
//! ```bash
//! sudo ovpn-fulltunnel setup
//! # paste the .ovpn contents, end with Ctrl-D, then:
//! sudo systemctl start openvpn-client@office
//! ```

pub mod config;
pub mod netinfo;
pub mod preflight;
pub mod setup;
pub mod state;

pub use config::Config;
pub use netinfo::NetworkInfo;
pub use state::SetupState;
