use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::abi::ContractInterface;
use crate::infrastructure::content::IpfsClusterConfig;

const BUNDLED_INTERFACE: &str = include_str!("../../assets/mint_interface.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9094".to_string(),
            username: None,
            password: None,
        }
    }
}

impl From<&ContentStoreConfig> for IpfsClusterConfig {
    fn from(config: &ContentStoreConfig) -> Self {
        Self {
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_secs: u64,
    pub verify_every_secs: u64,
    pub reclaim_every_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            verify_every_secs: 30,
            reclaim_every_secs: 300,
        }
    }
}

impl SchedulerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn verify_every(&self) -> Duration {
        Duration::from_secs(self.verify_every_secs)
    }

    pub fn reclaim_every(&self) -> Duration {
        Duration::from_secs(self.reclaim_every_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc_url: String,

    /// Defaults to `mintcheck.sqlite3` in the data directory
    pub database_path: Option<PathBuf>,

    /// Contract interface JSON; the bundled ERC-721 interface when unset
    pub interface_path: Option<PathBuf>,

    pub mint_function: String,

    pub content_store: ContentStoreConfig,

    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            database_path: None,
            interface_path: None,
            mint_function: "mintNFT".to_string(),
            content_store: ContentStoreConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("invalid config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_secs == 0 {
            bail!("scheduler.tick_secs must be greater than zero");
        }
        if self.mint_function.trim().is_empty() {
            bail!("mint_function must not be empty");
        }
        Ok(())
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("mintcheck.sqlite3")))
    }

    /// Load the configured contract interface
    pub fn contract_interface(&self) -> Result<ContractInterface> {
        match &self.interface_path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("read interface {}", path.display()))?;
                ContractInterface::from_json(&content)
                    .with_context(|| format!("parse interface {}", path.display()))
            }
            None => ContractInterface::from_json(BUNDLED_INTERFACE).context("parse bundled interface"),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("MINTCHECK_RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(path) = std::env::var_os("MINTCHECK_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Ok(url) = std::env::var("MINTCHECK_CONTENT_STORE_URL") {
            self.content_store.url = url;
        }
    }
}

/// Load configuration from `path`, or from [`config_path`] when `None`.
///
/// A missing file yields defaults; a malformed one is an error. Environment
/// overrides are applied last.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).or_else(config_path);
    let mut config = match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("read config {}", path.display()))?;
            Config::parse(&content).with_context(|| format!("load {}", path.display()))?
        }
        _ => Config::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("MINTCHECK_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("mintcheck").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("mintcheck").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "mintcheck", "mintcheck")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("mintcheck"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("mintcheck"));
    }
    directories::ProjectDirs::from("io", "mintcheck", "mintcheck")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.mint_function, "mintNFT");
        assert_eq!(config.scheduler.tick(), Duration::from_secs(5));
        assert_eq!(config.scheduler.verify_every(), Duration::from_secs(30));
        assert_eq!(config.scheduler.reclaim_every(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            rpc_url = "https://rpc.example"
            interface_path = "/etc/mintcheck/abi.json"

            [content_store]
            username = "cluster"

            [scheduler]
            verify_every_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc_url, "https://rpc.example");
        assert_eq!(config.content_store.url, "http://127.0.0.1:9094");
        assert_eq!(config.content_store.username.as_deref(), Some("cluster"));
        assert_eq!(config.scheduler.tick_secs, 5);
        assert_eq!(config.scheduler.verify_every_secs, 60);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = Config::parse("[scheduler]\ntick_secs = 0").unwrap_err();
        assert!(err.to_string().contains("tick_secs"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_url = [").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.scheduler.tick_secs, 5);
    }

    #[test]
    fn test_bundled_interface_has_mint() {
        let interface = Config::default().contract_interface().unwrap();
        assert!(interface
            .descriptors
            .iter()
            .any(|d| d.name.as_deref() == Some("mintNFT")));
    }

    #[test]
    fn test_interface_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"abi": [{{"type": "function", "name": "ping", "inputs": []}}]}}"#
        )
        .unwrap();
        let config = Config {
            interface_path: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        let interface = config.contract_interface().unwrap();
        assert_eq!(interface.descriptors.len(), 1);
    }
}
