//! Runtime configuration from the environment (and `.env`, via `dotenvy`).

use std::path::PathBuf;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory for persisted session state.
pub const DEFAULT_STATE_DIR: &str = ".payroll/state";

/// Default HTTP body limit; a little above the 10 MiB upload limit so the
/// structure check, not the transport, reports oversized files.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 12 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PAYROLL_PORT`
    pub port: u16,
    /// `PAYROLL_STATE_DIR`
    pub state_dir: PathBuf,
    /// `PAYROLL_MAX_UPLOAD_BYTES`
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or unparsable values
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PAYROLL_PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);

        let state_dir = lookup("PAYROLL_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);

        let max_upload_bytes = lookup("PAYROLL_MAX_UPLOAD_BYTES")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_upload_bytes);

        Self { port, state_dir, max_upload_bytes }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PAYROLL_PORT", "8080"),
            ("PAYROLL_STATE_DIR", "/var/lib/payroll"),
            ("PAYROLL_MAX_UPLOAD_BYTES", "1048576"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/payroll"));
        assert_eq!(config.max_upload_bytes, 1_048_576);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PAYROLL_PORT", "http"),
            ("PAYROLL_STATE_DIR", "  "),
            ("PAYROLL_MAX_UPLOAD_BYTES", "0"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_port_wins() {
        let config = AppConfig::default().with_port(Some(9000));
        assert_eq!(config.port, 9000);
        assert_eq!(AppConfig::default().with_port(None).port, 3000);
    }
}
