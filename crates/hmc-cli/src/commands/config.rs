//! Config command - resolve and print the effective operator configuration

use hmc_core::OperatorConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliError, Result};

/// File looked up in the user config directory when no path is given
const USER_CONFIG_FILE: &str = "hmc/config.yaml";

/// Resolve the configuration file to use
///
/// An explicit path (flag or `HMC_CONFIG`) wins; otherwise
/// `<config dir>/hmc/config.yaml` is used when it exists.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Load the effective configuration
pub fn load(explicit: Option<&Path>) -> Result<OperatorConfig> {
    let path = config_path(explicit);
    debug!(path = ?path, "loading operator configuration");
    OperatorConfig::load(path.as_deref()).map_err(|e| match path {
        Some(path) => CliError::config(format!("{}: {}", path.display(), e)),
        None => CliError::from(e),
    })
}

/// Run the config command
pub fn run(config: &OperatorConfig, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config).map_err(|e| CliError::internal(e.to_string()))?
    } else {
        config.to_yaml()?
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/etc/hmc/config.yaml");
        assert_eq!(config_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_load_reports_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retryInterval: 0s").unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("retryInterval must be greater than zero"));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Some(Path::new("/nonexistent/hmc.yaml"))).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
