use std::collections::{BTreeMap, HashSet};

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    JsonFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Memory, data_dir: default_data_dir() }
    }
}

fn default_data_dir() -> String { "data".to_string() }

/// One CRUD collection mounted at `/{name}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Records preloaded into the in-memory backend.
    #[serde(default)]
    pub seed: Vec<toml::Table>,
}

impl ResourceConfig {
    pub fn named(name: &str, required: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            required_fields: required.iter().map(|s| s.to_string()).collect(),
            seed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExchangeConfig {
    /// Units of each currency per one unit of a shared base.
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

const RESERVED_NAMES: [&str; 2] = ["exchange", "health"];

pub fn default_resources() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::named("items", &["name"]),
        ResourceConfig::named("users", &["name"]),
        ResourceConfig::named("tasks", &["name"]),
    ]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Built-in configuration used when no config file exists: memory backend,
    /// default resources, address from `SERVER_HOST` / `SERVER_PORT`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize();
        if self.resources.is_empty() {
            self.resources = default_resources();
        }
        let mut seen = HashSet::new();
        for r in &mut self.resources {
            r.normalize()?;
            if !seen.insert(r.name.clone()) {
                return Err(anyhow!("duplicate resource name `{}`", r.name));
            }
        }
        self.exchange.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}

impl ResourceConfig {
    fn normalize(&mut self) -> Result<()> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(anyhow!("resource name must not be empty"));
        }
        let url_safe = self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !url_safe {
            return Err(anyhow!("resource name `{}` may only contain [a-z0-9_-]", self.name));
        }
        if RESERVED_NAMES.contains(&self.name.as_str()) {
            return Err(anyhow!("resource name `{}` is reserved", self.name));
        }
        if self.required_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(anyhow!("resource `{}` lists an empty required field", self.name));
        }
        Ok(())
    }
}

impl ExchangeConfig {
    fn validate(&self) -> Result<()> {
        for (code, rate) in &self.rates {
            if !(rate.is_finite() && *rate > 0.0) {
                return Err(anyhow!("exchange rate for {} must be a positive number", code));
            }
        }
        Ok(())
    }
}
