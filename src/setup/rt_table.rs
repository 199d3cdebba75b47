//! Route table registry
//!
//! Policy routing needs a named table in the system registry, normally
//! `/etc/iproute2/rt_tables`. The entry is appended once and never removed;
//! teardown only flushes the table's routes, so a leftover id/name pair is
//! inert.

use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RtTableError {
    #[error("Failed to update route table registry: {0}")]
    Io(#[from] std::io::Error),
}

/// Append `<id> <name>` to the registry unless a table with that name or id
/// is already registered. Returns whether an entry was added.
pub fn ensure_table(registry: &Path, id: u32, name: &str) -> Result<bool, RtTableError> {
    let content = fs::read_to_string(registry).unwrap_or_default();

    if is_registered(&content, id, name) {
        debug!("Route table {} ({}) already registered", name, id);
        return Ok(false);
    }

    let mut entry = format!("{} {}\n", id, name);
    if !content.is_empty() && !content.ends_with('\n') {
        entry.insert(0, '\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(registry)?;
    file.write_all(entry.as_bytes())?;

    info!(
        "Registered route table {} {} in {}",
        id,
        name,
        registry.display()
    );
    Ok(true)
}

fn is_registered(content: &str, id: u32, name: &str) -> bool {
    content.lines().filter_map(strip_comment).any(|line| {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(entry_id), Some(entry_name)) => {
                entry_name == name || entry_id.parse::<u32>() == Ok(id)
            }
            _ => false,
        }
    })
}

fn strip_comment(line: &str) -> Option<&str> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() { None } else { Some(line) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STOCK_REGISTRY: &str = "\
#
# reserved values
#
255\tlocal
254\tmain
253\tdefault
0\tunspec
#
# local
#
";

    fn registry_with(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rt_tables");
        fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_appends_to_stock_registry() {
        let (_temp, path) = registry_with(STOCK_REGISTRY);

        let added = ensure_table(&path, 100, "main_route").unwrap();
        assert!(added);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(STOCK_REGISTRY));
        assert!(content.ends_with("100 main_route\n"));
    }

    #[test]
    fn test_second_run_does_not_duplicate() {
        let (_temp, path) = registry_with(STOCK_REGISTRY);

        assert!(ensure_table(&path, 100, "main_route").unwrap());
        assert!(!ensure_table(&path, 100, "main_route").unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("main_route").count(), 1);
    }

    #[test]
    fn test_existing_name_is_detected() {
        let (_temp, path) = registry_with("200 main_route\n");
        assert!(!ensure_table(&path, 100, "main_route").unwrap());
    }

    #[test]
    fn test_existing_id_is_detected() {
        let (_temp, path) = registry_with("100 something_else\n");
        assert!(!ensure_table(&path, 100, "main_route").unwrap());
    }

    #[test]
    fn test_commented_entry_is_ignored() {
        let (_temp, path) = registry_with("# 100 main_route\n");
        assert!(ensure_table(&path, 100, "main_route").unwrap());
    }

    #[test]
    fn test_missing_trailing_newline_is_repaired() {
        let (_temp, path) = registry_with("254 main");

        ensure_table(&path, 100, "main_route").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "254 main\n100 main_route\n");
    }

    #[test]
    fn test_creates_registry_when_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rt_tables");

        assert!(ensure_table(&path, 100, "main_route").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "100 main_route\n");
    }

    #[test]
    fn test_tab_separated_entries_recognized() {
        let (_temp, path) = registry_with("100\tmain_route\n");
        assert!(!ensure_table(&path, 100, "main_route").unwrap());
    }
}
