use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decay::DEFAULT_INTERVAL_SECS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_decay_interval")]
    pub decay_interval_secs: u64,
    #[serde(default = "default_scheduler_tick")]
    pub scheduler_tick_secs: u64,
    #[serde(default = "default_low_stat_threshold")]
    pub low_stat_threshold: i32,
    #[serde(default = "default_objective_reward")]
    pub objective_reward: u32,
}

fn default_decay_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_scheduler_tick() -> u64 {
    60
}

fn default_low_stat_threshold() -> i32 {
    20
}

fn default_objective_reward() -> u32 {
    25
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("habitpet")
        });

        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                warn!("config file is empty, using defaults");
            } else {
                match serde_json::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.data_dir = data_dir;
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!("failed to parse config.json, using defaults: {}", e);
                    }
                }
            }
            return Ok(Self::default_config(data_dir));
        }

        let config = Self::default_config(data_dir);
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    pub fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            decay_interval_secs: default_decay_interval(),
            scheduler_tick_secs: default_scheduler_tick(),
            low_stat_threshold: default_low_stat_threshold(),
            objective_reward: default_objective_reward(),
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("habitpet-config-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_creates_default_config() {
        let dir = temp_dir();
        let config = Config::new(Some(dir.clone())).unwrap();
        assert_eq!(config.decay_interval_secs, 600);
        assert!(dir.join("config.json").exists());
        assert_eq!(config.state_file(), dir.join("state.json"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), r#"{"decay_interval_secs": 30}"#).unwrap();
        let config = Config::new(Some(dir.clone())).unwrap();
        assert_eq!(config.decay_interval_secs, 30);
        assert_eq!(config.scheduler_tick_secs, 60);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_garbage_config_falls_back() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), "not json").unwrap();
        let config = Config::new(Some(dir.clone())).unwrap();
        assert_eq!(config, Config::default_config(dir.clone()));
        let _ = std::fs::remove_dir_all(dir);
    }
}
