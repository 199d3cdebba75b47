//! The setup pipeline
//!
//! Steps run in a fixed order and the first failure aborts the run:
//!
//! 1. Preflight: root privileges and required external commands
//! 2. Network detection: default gateway and egress interface
//! 3. Ingestion: VPN config filename plus pasted body
//! 4. Route table registration in rt_tables (idempotent)
//! 5. Hook script generation (route-up.sh / route-down.sh)
//! 6. VPN config rewrite to reference the generated hooks
//!
//! Nothing applied by an earlier step is rolled back when a later step
//! fails; each step on its own is either idempotent or a plain overwrite,
//! so re-running setup after a failure is safe.

pub mod hooks;
pub mod ingest;
pub mod ovpn_config;
pub mod rt_table;

use crate::config::Config;
use crate::netinfo::{self, NetInfoError};
use crate::preflight::{self, PreflightError};
use crate::state::{SetupState, StateError};
use hooks::HookError;
use ingest::{ConfigName, IngestError};
use ovpn_config::OvpnConfigError;
use rt_table::RtTableError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Preflight check failed: {0}")]
    Preflight(#[from] PreflightError),
    #[error("Network detection failed: {0}")]
    NetInfo(#[from] NetInfoError),
    #[error("Config ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("Route table registration failed: {0}")]
    RtTable(#[from] RtTableError),
    #[error("Hook script generation failed: {0}")]
    Hooks(#[from] HookError),
    #[error("VPN config rewrite failed: {0}")]
    OvpnConfig(#[from] OvpnConfigError),
    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Command-line overrides for the interactive parts of the pipeline.
#[derive(Debug, Default)]
pub struct SetupOptions {
    /// Config filename; prompted for when absent.
    pub name: Option<String>,
    /// Read the config body from this file instead of standard input.
    pub input: Option<PathBuf>,
}

/// Run the whole pipeline and persist a record of what was configured.
pub fn run(config: &Config, opts: &SetupOptions) -> Result<SetupState, SetupError> {
    preflight::check()?;

    let net = netinfo::detect(&config.routing.probe_address)?;

    let name = match &opts.name {
        Some(name) => ConfigName::parse(name)?,
        None => {
            let stdin = io::stdin();
            ingest::prompt_config_name(&mut stdin.lock(), &mut io::stderr())?
        }
    };

    let body = match &opts.input {
        Some(path) => {
            let mut file = std::fs::File::open(path).map_err(IngestError::Io)?;
            ingest::read_config_body(&mut file)?
        }
        None => {
            if io::stdin().is_terminal() {
                eprintln!("Paste the VPN config now, finish with Ctrl-D:");
            }
            let stdin = io::stdin();
            let mut lock = stdin.lock();
            ingest::read_config_body(&mut lock)?
        }
    };

    let config_path = ingest::write_config(&config.paths.client_dir, &name, &body)?;

    rt_table::ensure_table(
        &config.paths.rt_tables,
        config.routing.table_id,
        &config.routing.table_name,
    )?;

    let scripts = hooks::write_hook_scripts(&config.paths.client_dir, &net, &config.routing)?;

    ovpn_config::apply(&config_path, &scripts.up, &scripts.down)?;

    let state = SetupState {
        service: name.service.clone(),
        config_path,
        gateway: net.gateway,
        interface: net.interface,
        up_script: scripts.up,
        down_script: scripts.down,
    };
    state.save(&config.paths.state_file)?;

    info!("Setup complete for service {}", name.service);
    Ok(state)
}
