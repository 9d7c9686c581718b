//! TOML loading for `GameConfig`. Missing keys keep their defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use autobatt_core::GameConfig;

pub fn load(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse(&text).with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn parse(text: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(text).context("Failed to parse config TOML")?;
    config.validate()?;
    Ok(config)
}
