// Configuration loader
// Reads ~/.misoul/config.toml (or $MISOUL_CONFIG), then applies environment overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{Config, GenerationConfig, ServerConfig};
use crate::errors::{api_key_missing_error, config_parse_error, ConfigError};

/// On-disk shape of config.toml; every field is optional
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    google_api_key: Option<String>,
    model: Option<String>,
    #[serde(default)]
    generation: Option<GenerationConfig>,
    #[serde(default)]
    server: Option<ServerConfig>,
    knowledge_path: Option<PathBuf>,
    top_k: Option<usize>,
    crisis_keywords_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

/// Load configuration from the config file and environment
pub fn load_config() -> Result<Config> {
    let file = match config_path() {
        Some(path) if path.exists() => Some(read_toml(&path)?),
        _ => None,
    };

    build_config(file.unwrap_or_default(), |key| std::env::var(key).ok())
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    let file = read_toml(path)?;
    build_config(file, |key| std::env::var(key).ok())
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MISOUL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".misoul").join("config.toml"))
}

fn read_toml(path: &Path) -> Result<TomlConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).map_err(|e| {
        anyhow::Error::new(ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
        .context(config_parse_error(&e.to_string()))
    })
}

fn build_config<F>(file: TomlConfig, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let api_key = non_empty("GOOGLE_API_KEY")
        .or(file.google_api_key)
        .filter(|k| !k.trim().is_empty());

    let Some(api_key) = api_key else {
        return Err(anyhow::Error::new(ConfigError::MissingCredential("GOOGLE_API_KEY"))
            .context(api_key_missing_error()));
    };

    let mut config = Config::new(api_key);

    if let Some(model) = non_empty("MODEL_NAME").or(file.model) {
        config.model = model;
    }
    if let Some(generation) = file.generation {
        config.generation = generation;
    }
    if let Some(server) = file.server {
        config.server = server;
    }
    if let Some(key) = non_empty("MISOUL_API_KEY") {
        config.server.api_key = Some(key);
    }
    if let Some(port) = non_empty("PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("PORT must be a number, got '{}'", port))?;
        let host = config
            .server
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind_address = format!("{}:{}", host, port);
    }

    config.knowledge_path = non_empty("MISOUL_KNOWLEDGE_PATH")
        .map(PathBuf::from)
        .or(file.knowledge_path);
    if let Some(top_k) = file.top_k {
        config.top_k = top_k.max(1);
    }
    config.crisis_keywords_path = file.crisis_keywords_path;
    config.log_file = file.log_file;

    Ok(config)
}
