//! Default gateway and interface detection
//!
//! Asks the kernel how it would reach a public probe address and pulls the
//! gateway IP and egress interface out of the answer. The text parsing is
//! kept in its own function so it could be swapped for a netlink query
//! without touching callers.

use std::net::Ipv4Addr;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NetInfoError {
    #[error("Failed to run `ip route get`: {0}")]
    CommandFailed(#[from] std::io::Error),
    #[error("`ip route get {probe}` failed: {stderr}")]
    QueryFailed { probe: String, stderr: String },
    #[error("Could not determine default gateway from route output")]
    NoGateway,
    #[error("Could not determine egress interface from route output")]
    NoInterface,
    #[error("Gateway is not a valid IPv4 address: {0}")]
    InvalidGateway(String),
}

/// Gateway and interface of the current default path. Captured once per run;
/// the generated hook scripts embed these as literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub gateway: Ipv4Addr,
    pub interface: String,
}

/// Query the route to `probe` and extract the default gateway and interface.
pub fn detect(probe: &str) -> Result<NetworkInfo, NetInfoError> {
    debug!("Querying route to probe address {}", probe);

    let output = Command::new("ip").args(["route", "get", probe]).output()?;
    if !output.status.success() {
        return Err(NetInfoError::QueryFailed {
            probe: probe.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let info = parse_route_output(&stdout)?;
    info!(
        "Detected gateway {} on interface {}",
        info.gateway, info.interface
    );
    Ok(info)
}

/// Extract the gateway (token after `via`) and interface (token after `dev`)
/// from `ip route get` output, e.g.:
///
/// ```text
/// 1.1.1.1 via 192.168.1.1 dev eth0 src 192.168.1.50 uid 0
/// ```
pub fn parse_route_output(output: &str) -> Result<NetworkInfo, NetInfoError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();

    let gateway = tokens
        .iter()
        .position(|&t| t == "via")
        .and_then(|i| tokens.get(i + 1))
        .ok_or(NetInfoError::NoGateway)?;

    let interface = tokens
        .iter()
        .position(|&t| t == "dev")
        .and_then(|i| tokens.get(i + 1))
        .ok_or(NetInfoError::NoInterface)?;

    let gateway = gateway
        .parse()
        .map_err(|_| NetInfoError::InvalidGateway(gateway.to_string()))?;

    Ok(NetworkInfo {
        gateway,
        interface: interface.to_string(),
    })
}
