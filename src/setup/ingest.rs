//! VPN client config ingestion
//!
//! The config body arrives on standard input (pasted, piped, or redirected
//! from a file) and is read until end of stream. The filename is asked for
//! separately and must end in `.ovpn` or `.conf`; the service identifier is
//! the filename with that suffix removed, which is what
//! `openvpn-client@<service>` expects.
//!
//! Readers and writers are passed in rather than hardwired to the terminal
//! so the whole step can be exercised against in-memory fixtures.

use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const RECOGNIZED_SUFFIXES: &[&str] = &[".conf", ".ovpn"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error during ingestion: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config filename must end in .conf or .ovpn: {0}")]
    BadSuffix(String),
    #[error("No config filename provided")]
    NoFilename,
    #[error("Pasted config was empty, nothing written")]
    EmptyInput,
}

/// A validated config filename plus the service identifier derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigName {
    pub file_name: String,
    pub service: String,
}

impl ConfigName {
    /// Validate a filename and derive the service identifier by stripping
    /// one recognized suffix.
    pub fn parse(name: &str) -> Result<Self, IngestError> {
        let name = name.trim();
        for suffix in RECOGNIZED_SUFFIXES {
            if let Some(service) = name.strip_suffix(suffix) {
                if !service.is_empty() {
                    return Ok(Self {
                        file_name: name.to_string(),
                        service: service.to_string(),
                    });
                }
            }
        }
        Err(IngestError::BadSuffix(name.to_string()))
    }
}

/// Prompt until a name with a recognized suffix is entered. End of stream
/// before a valid name is fatal.
pub fn prompt_config_name<R, W>(input: &mut R, prompt_out: &mut W) -> Result<ConfigName, IngestError>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(prompt_out, "Config filename (.ovpn or .conf): ")?;
        prompt_out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(IngestError::NoFilename);
        }

        match ConfigName::parse(&line) {
            Ok(name) => return Ok(name),
            Err(IngestError::BadSuffix(bad)) => {
                warn!("Rejected filename: {:?}", bad);
                writeln!(prompt_out, "Not a .ovpn or .conf name, try again.")?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read the whole config body until end of stream. Whitespace-only input
/// counts as empty.
pub fn read_config_body<R: Read>(input: &mut R) -> Result<String, IngestError> {
    let mut body = String::new();
    input.read_to_string(&mut body)?;

    if body.trim().is_empty() {
        return Err(IngestError::EmptyInput);
    }

    Ok(body)
}

/// Write the ingested config verbatim, creating the client dir if absent.
pub fn write_config(
    client_dir: &Path,
    name: &ConfigName,
    body: &str,
) -> Result<PathBuf, IngestError> {
    std::fs::create_dir_all(client_dir)?;
    let path = client_dir.join(&name.file_name);
    std::fs::write(&path, body)?;
    info!("Wrote VPN config to {}", path.display());
    Ok(path)
}
