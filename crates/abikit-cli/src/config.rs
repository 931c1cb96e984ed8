//! CLI configuration management

use abikit::abi::DecodeOptions;
use abikit::types::BlockId;
use abikit::ClientConfig;
use abikit_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration, stored in `~/.abikit/config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Sender for `call`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Block that `call` runs against
    #[serde(default)]
    pub block: BlockId,
    /// Decoder switches
    #[serde(default)]
    pub decode: DecodeOptions,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            from: None,
            block: BlockId::default(),
            decode: DecodeOptions::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".abikit"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load config from file or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::default(),
        }
    }

    /// Load config from `path`, falling back to defaults when it is unreadable
    pub fn load_from(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "Cannot determine config path")
        })?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Library-side settings derived from this config
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            from: self.from,
            gas: None,
            block: self.block,
            decode: self.decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.block, BlockId::Latest);
        assert!(!config.decode.allow_junk_data);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("rpc_url"));
        assert!(toml.contains("block = \"latest\""));
        assert!(!toml.contains("from"));
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            rpc_url = "http://example.com:8545"
            from = "0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d"
            block = "0x64"

            [decode]
            allow_junk_data = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rpc_url, "http://example.com:8545");
        assert_eq!(config.block, BlockId::Number(100));
        assert!(config.from.is_some());
        assert!(config.decode.allow_junk_data);
        assert_eq!(config.decode.max_length, DecodeOptions::default().max_length);

        let client = config.client_config();
        assert_eq!(client.from, config.from);
        assert!(client.decode.allow_junk_data);
    }

    #[test]
    fn test_config_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "rpc_url = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::write(&path, "rpc_url = \"http://node:8545\"").unwrap();
        assert_eq!(Config::load_from(&path).rpc_url, "http://node:8545");
    }
}
