use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::carousel;

const DEFAULT_ENV_PREFIX: &str = "STREAMGRID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("streamgrid/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_carousel_interval", with = "humantime_serde")]
    pub carousel_interval: Duration,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            carousel_interval: default_carousel_interval(),
        }
    }
}

fn default_theme() -> String {
    "default".into()
}

fn default_carousel_interval() -> Duration {
    carousel::DEFAULT_INTERVAL
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    #[serde(default = "default_video_command")]
    pub video_command: Vec<String>,
    #[serde(default = "default_video_detach")]
    pub video_detach: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            video_command: default_video_command(),
            video_detach: default_video_detach(),
        }
    }
}

fn default_video_command() -> Vec<String> {
    vec!["mpv".into(), "--fs".into(), "%URL%".into()]
}

fn default_video_detach() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.catalog.user_agent.is_empty() {
        base.catalog.user_agent = other.catalog.user_agent;
    }

    if !other.ui.theme.is_empty() {
        base.ui.theme = other.ui.theme;
    }
    if !other.ui.carousel_interval.is_zero() {
        base.ui.carousel_interval = other.ui.carousel_interval;
    }

    if !other.player.video_command.is_empty() {
        base.player.video_command = other.player.video_command;
    }
    base.player.video_detach = other.player.video_detach;

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "catalog.user_agent" => cfg.catalog.user_agent = value,
        "ui.theme" => cfg.ui.theme = value,
        "ui.carousel_interval" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.ui.carousel_interval = duration;
            }
        }
        "player.video_command" => {
            cfg.player.video_command = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "player.video_detach" => {
            cfg.player.video_detach = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("streamgrid").join("config.yaml"))
}
