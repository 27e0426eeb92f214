pub mod schema;

pub use schema::{ServerConfig, DEFAULT_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default config file location (~/.decision-mcp/config.toml).
pub fn default_config_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".decision-mcp"))
        .unwrap_or_else(|| PathBuf::from(".decision-mcp"))
        .join("config.toml")
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read server config file")?;
        let config: ServerConfig =
            toml::from_str(&contents).context("Failed to parse server config (TOML)")?;
        Ok(config)
    } else {
        Ok(ServerConfig::default())
    }
}

/// Command-line and environment values layered over the file config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub deployment_spaces: Option<Vec<String>>,
    pub decision_service_ids: Option<Vec<String>>,
    pub poll_interval_ms: Option<u64>,
    pub apikey: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Apply every value that was given, leaving the rest untouched.
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(spaces) = self.deployment_spaces {
            config.deployment_spaces = clean_list(spaces);
        }
        if let Some(ids) = self.decision_service_ids {
            let ids = clean_list(ids);
            config.decision_service_ids = (!ids.is_empty()).then_some(ids);
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(apikey) = self.apikey {
            config.apikey = apikey;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config
    }
}

/// Trim entries and drop empty ones (`"a, ,b"` style input).
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn file_values_are_read_and_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
url = "https://runtime.example.com/api"
deployment_spaces = ["staging", "production"]
poll_interval_ms = 5000
username = "ops"
"#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.deployment_spaces, vec!["staging", "production"]);
        assert_eq!(cfg.poll_interval_ms, 5000);

        let cfg = ConfigOverrides {
            deployment_spaces: Some(vec![" qa ".into(), "".into()]),
            decision_service_ids: Some(vec!["loan/approval".into()]),
            poll_interval_ms: Some(2000),
            ..ConfigOverrides::default()
        }
        .apply(cfg);
        assert_eq!(cfg.url, "https://runtime.example.com/api");
        assert_eq!(cfg.deployment_spaces, vec!["qa"]);
        assert_eq!(
            cfg.decision_service_ids,
            Some(vec!["loan/approval".to_string()])
        );
        assert_eq!(cfg.poll_interval_ms, 2000);
    }

    #[test]
    fn blank_service_id_list_means_enumerate() {
        let cfg = ConfigOverrides {
            decision_service_ids: Some(vec![" ".into()]),
            ..ConfigOverrides::default()
        }
        .apply(ServerConfig::default());
        assert!(cfg.decision_service_ids.is_none());
    }
}
