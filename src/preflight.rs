//! Privilege and dependency checks
//!
//! Everything after this point writes under /etc and mutates kernel routing
//! state, so these run first and the whole process aborts on the first
//! failure rather than continuing partially.

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("This tool must be run as root")]
    NotRoot,
    #[error("Required command not found on PATH: {0}")]
    MissingDependency(String),
}

/// External binaries the pipeline and the generated hooks invoke.
pub const REQUIRED_COMMANDS: &[&str] = &["openvpn", "iptables", "ip"];

/// Verify root privileges and that every required command resolves on PATH.
pub fn check() -> Result<(), PreflightError> {
    ensure_root()?;

    for cmd in REQUIRED_COMMANDS {
        let path = find_on_path(cmd)
            .ok_or_else(|| PreflightError::MissingDependency(cmd.to_string()))?;
        debug!("Found {} at {}", cmd, path.display());
    }

    Ok(())
}

fn ensure_root() -> Result<(), PreflightError> {
    if nix::unistd::Uid::effective().is_root() {
        Ok(())
    } else {
        Err(PreflightError::NotRoot)
    }
}

/// Resolve an executable by scanning PATH, `command -v` style.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    find_in_dirs(env::split_paths(&path_var), name)
}

fn find_in_dirs<I>(dirs: I, name: &str) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn test_find_in_dirs_locates_executable() {
        let temp = TempDir::new().unwrap();
        let expected = make_executable(temp.path(), "openvpn");

        let found = find_in_dirs(vec![temp.path().to_path_buf()], "openvpn");
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_find_in_dirs_skips_non_executable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("iptables");
        fs::write(&path, "").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).unwrap();

        let found = find_in_dirs(vec![temp.path().to_path_buf()], "iptables");
        assert_eq!(found, None);
    }

    #[test]
    fn test_find_in_dirs_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = make_executable(first.path(), "ip");
        make_executable(second.path(), "ip");

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_in_dirs(dirs, "ip"), Some(expected));
    }

    #[test]
    fn test_find_on_path_missing_command() {
        assert!(find_on_path("definitely-not-a-real-command-12345").is_none());
    }

    #[test]
    fn test_preflight_error_display() {
        let err = PreflightError::NotRoot;
        assert_eq!(err.to_string(), "This tool must be run as root");

        let err = PreflightError::MissingDependency("openvpn".to_string());
        assert!(err.to_string().contains("openvpn"));
    }
}
