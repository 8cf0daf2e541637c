//! Server configuration.
//!
//! The binary is configured through environment variables:
//! `RULES_BIND_ADDR` (default `127.0.0.1:3000`) and
//! `RULES_TEMPLATE_DIR`, a directory of template JSON files used to
//! seed the catalog (default `templates`).  Log verbosity follows
//! `RUST_LOG`.

use std::path::PathBuf;

pub const BIND_ADDR_VAR: &str = "RULES_BIND_ADDR";
pub const TEMPLATE_DIR_VAR: &str = "RULES_TEMPLATE_DIR";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TEMPLATE_DIR: &str = "templates";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub template_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.  Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            bind_addr: get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            template_dir: PathBuf::from(
                get(TEMPLATE_DIR_VAR).unwrap_or_else(|| DEFAULT_TEMPLATE_DIR.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.template_dir, PathBuf::from("templates"));
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let vars: HashMap<&str, &str> = [(BIND_ADDR_VAR, "0.0.0.0:8080"), (TEMPLATE_DIR_VAR, " ")]
            .into_iter()
            .collect();
        let config = ServerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.template_dir, PathBuf::from("templates"));
    }
}
