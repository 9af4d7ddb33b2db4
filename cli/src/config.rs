use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use nutrilog_core::usda::{DEFAULT_BASE_URL, DEMO_API_KEY, UsdaConfig};

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub usda: UsdaConfig,
}

impl Config {
    /// Resolve paths and lookup settings. `db_override` replaces the default
    /// database location.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nutrilog").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = db_override.unwrap_or_else(|| data_dir.join("nutrilog.db"));

        let usda = usda_config_from(
            std::env::var("USDA_API_KEY").ok(),
            std::env::var("USDA_API_URL").ok(),
        );

        Ok(Config {
            db_path,
            data_dir,
            usda,
        })
    }
}

fn usda_config_from(api_key: Option<String>, base_url: Option<String>) -> UsdaConfig {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    UsdaConfig {
        api_key: non_empty(api_key).unwrap_or_else(|| DEMO_API_KEY.to_string()),
        base_url: non_empty(base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        ..UsdaConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usda_config_defaults() {
        let config = usda_config_from(None, None);
        assert_eq!(config.api_key, DEMO_API_KEY);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let blank = usda_config_from(Some("  ".to_string()), Some(String::new()));
        assert_eq!(blank.api_key, DEMO_API_KEY);
        assert_eq!(blank.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_usda_config_from_env_values() {
        let config = usda_config_from(
            Some("abc123".to_string()),
            Some("http://localhost:8080/fdc/v1".to_string()),
        );
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.base_url, "http://localhost:8080/fdc/v1");
        assert_eq!(config.timeout_secs, 10);
    }
}
