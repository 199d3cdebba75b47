//! Hook script generation
//!
//! OpenVPN runs these scripts at tunnel-up and tunnel-down. The detected
//! gateway and interface are baked in as shell literals at generation time;
//! the scripts deliberately ignore whatever arguments and environment
//! OpenVPN passes, so they behave the same no matter how they are invoked.
//!
//! Both scripts are fully regenerated on every setup run and never merged
//! with existing content.

use crate::config::RoutingConfig;
use crate::netinfo::NetworkInfo;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const UP_SCRIPT: &str = "route-up.sh";
pub const DOWN_SCRIPT: &str = "route-down.sh";

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Failed to write hook script: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths of the generated up/down scripts.
#[derive(Debug, Clone)]
pub struct HookScripts {
    pub up: PathBuf,
    pub down: PathBuf,
}

/// Overwrite both hook scripts in the client dir and mark them executable.
pub fn write_hook_scripts(
    client_dir: &Path,
    net: &NetworkInfo,
    routing: &RoutingConfig,
) -> Result<HookScripts, HookError> {
    fs::create_dir_all(client_dir)?;

    let up = client_dir.join(UP_SCRIPT);
    let down = client_dir.join(DOWN_SCRIPT);

    write_executable(&up, &render_up_script(net, routing))?;
    write_executable(&down, &render_down_script(net, routing))?;

    info!(
        "Generated hook scripts {} and {}",
        up.display(),
        down.display()
    );
    Ok(HookScripts { up, down })
}

fn write_executable(path: &Path, content: &str) -> Result<(), HookError> {
    fs::write(path, content)?;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Render the tunnel-up script.
///
/// Inbound connections on the physical interface are marked, the mark is
/// persisted on the conntrack entry and restored on output, and a rule sends
/// marked traffic to a dedicated table whose default route is the original
/// gateway. That keeps an established SSH session reachable after OpenVPN
/// takes over the main default route.
pub fn render_up_script(net: &NetworkInfo, routing: &RoutingConfig) -> String {
    format!(
        r#"#!/bin/sh
# Generated by ovpn-fulltunnel. Rewritten on every setup run; do not edit.

GATEWAY_IP="{gateway}"
MAIN_IF="{interface}"
TABLE_ID="{table_id}"
FWMARK="{fwmark:#x}"
RULE_PRIO="{priority}"

# Let the tunnel device settle before touching routing state.
sleep {delay}

# Replies to marked traffic leave via a different path than the tunnel,
# which strict reverse-path filtering would drop.
sysctl -w net.ipv4.conf.all.rp_filter=2
sysctl -w net.ipv4.conf.default.rp_filter=2
sysctl -w net.ipv4.conf.$MAIN_IF.rp_filter=2

iptables -t mangle -A PREROUTING -i "$MAIN_IF" -j MARK --set-mark "$FWMARK"
iptables -t mangle -A PREROUTING -i "$MAIN_IF" -j CONNMARK --save-mark
iptables -t mangle -A OUTPUT -j CONNMARK --restore-mark

ip route replace default via "$GATEWAY_IP" dev "$MAIN_IF" table "$TABLE_ID"
ip rule add fwmark "$FWMARK" table "$TABLE_ID" priority "$RULE_PRIO"
ip route flush cache
"#,
        gateway = net.gateway,
        interface = net.interface,
        table_id = routing.table_id,
        fwmark = routing.fwmark,
        priority = routing.rule_priority,
        delay = routing.up_delay_secs,
    )
}

/// Render the tunnel-down script, undoing each up step in reverse order.
pub fn render_down_script(net: &NetworkInfo, routing: &RoutingConfig) -> String {
    format!(
        r#"#!/bin/sh
# Generated by ovpn-fulltunnel. Rewritten on every setup run; do not edit.

MAIN_IF="{interface}"
TABLE_ID="{table_id}"
FWMARK="{fwmark:#x}"
RULE_PRIO="{priority}"

ip rule del fwmark "$FWMARK" table "$TABLE_ID" priority "$RULE_PRIO"
ip route flush table "$TABLE_ID"

iptables -t mangle -D OUTPUT -j CONNMARK --restore-mark
iptables -t mangle -D PREROUTING -i "$MAIN_IF" -j CONNMARK --save-mark
iptables -t mangle -D PREROUTING -i "$MAIN_IF" -j MARK --set-mark "$FWMARK"

sysctl -w net.ipv4.conf.all.rp_filter=1
sysctl -w net.ipv4.conf.default.rp_filter=1
sysctl -w net.ipv4.conf.$MAIN_IF.rp_filter=1
ip route flush cache
"#,
        interface = net.interface,
        table_id = routing.table_id,
        fwmark = routing.fwmark,
        priority = routing.rule_priority,
    )
}
