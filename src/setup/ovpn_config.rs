//! In-place edits to the ingested OpenVPN client config
//!
//! OpenVPN's own `redirect-gateway def1` would fight the policy routing, so
//! it gets commented out, and any hook directives already in the file are
//! replaced with ours. The rewrite is a pure text transform; applying it a
//! second time produces the same file, because each pass strips the managed
//! directives before re-appending them.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum OvpnConfigError {
    #[error("Failed to rewrite VPN config: {0}")]
    Io(#[from] std::io::Error),
}

/// Rewrite the config file on disk to use the generated hook scripts.
pub fn apply(path: &Path, up_script: &Path, down_script: &Path) -> Result<(), OvpnConfigError> {
    let content = fs::read_to_string(path)?;
    let rewritten = rewrite(&content, up_script, down_script);
    fs::write(path, rewritten)?;
    info!("Rewrote {} with managed hook directives", path.display());
    Ok(())
}

/// Pure rewrite of the config text:
///
/// - comment out `redirect-gateway def1` (leading whitespace tolerated)
/// - drop any existing `script-security` directive
/// - blank out existing `up`/`down` directives, then collapse blank runs
/// - append `script-security 2` plus `up`/`down` pointing at our scripts
pub fn rewrite(content: &str, up_script: &Path, down_script: &Path) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("redirect-gateway def1") {
            lines.push(format!("#{}", trimmed));
        } else if directive(trimmed) == Some("script-security") {
            // dropped entirely, re-added in the trailing block
        } else if matches!(directive(trimmed), Some("up") | Some("down")) {
            lines.push(String::new());
        } else {
            lines.push(line.to_string());
        }
    }

    let mut result = collapse_blank_runs(&lines);
    if !result.is_empty() {
        result.push_str("\n\n");
    }
    result.push_str("script-security 2\n");
    result.push_str(&format!("up {}\n", up_script.display()));
    result.push_str(&format!("down {}\n", down_script.display()));
    result
}

/// First whitespace-separated token of a line, the OpenVPN directive name.
fn directive(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

fn collapse_blank_runs(lines: &[String]) -> String {
    let mut out = String::new();
    let mut prev_blank = false;

    for line in lines {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push_str(line);
        out.push('\n');
        prev_blank = blank;
    }

    out.trim_end().to_string()
}
