use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CaetanoError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_farm_name")]
    pub farm_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_farm_name() -> String {
    "FAZENDA SÃO CAETANO".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            farm_name: default_farm_name(),
            log_level: default_log_level(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("caetano")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("caetano")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CaetanoError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Data directory for this run: the `--data-dir` override when given,
/// otherwise the configured one.
pub fn resolve_data_dir(data_dir: Option<&str>) -> PathBuf {
    match data_dir {
        Some(dir) => PathBuf::from(shellexpand_path(dir)),
        None => PathBuf::from(&load_settings().data_dir),
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/caetano".to_string(),
            farm_name: "Fazenda Boa Vista".to_string(),
            log_level: "debug".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.farm_name, "Fazenda Boa Vista");
        assert_eq!(loaded.data_dir, "/tmp/caetano");
        assert_eq!(loaded.log_level, "debug");
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.farm_name, "FAZENDA SÃO CAETANO");
        assert_eq!(s.log_level, "info");
        assert!(s.data_dir.ends_with("caetano"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.farm_name, "FAZENDA SÃO CAETANO");
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_override_wins_over_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        let resolved = resolve_data_dir(Some(&path));
        assert_eq!(resolved, std::fs::canonicalize(dir.path()).unwrap());
    }
}
