//! Configuration management for twin

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default system instruction sent ahead of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant. \
You can inspect the user's workspace with the list_files and read_file tools. \
Use them when the question depends on code you have not seen yet.";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat-completions endpoint
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model requests per prompt
    pub max_iterations: usize,
    /// Tool output cap in characters
    pub max_tool_output_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_tool_output_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the per-installation data directory
    pub dir: Option<PathBuf>,
    pub history_file: String,
    /// Mirror history into a second file and read it when the primary is empty
    pub backup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            history_file: "chatHistory.json".to_string(),
            backup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8766,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, defaulting when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "twin") {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            Ok(config_dir.join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Per-installation storage directory for chat history
    pub fn storage_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "twin")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".twin"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.storage_dir().join(&self.storage.history_file)
    }

    /// Backup mirror path, if enabled
    pub fn history_backup_path(&self) -> Option<PathBuf> {
        if !self.storage.backup {
            return None;
        }
        let stem = Path::new(&self.storage.history_file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "chatHistory".to_string());
        Some(self.storage_dir().join(format!("{}.backup.json", stem)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_groq() {
        let config = Config::default();
        assert_eq!(
            config.llm.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.max_tool_output_chars, 4000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"llama-3.3-70b-versatile\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.server.port, 8766);
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("nope.toml")).unwrap();
        assert_eq!(config.storage.history_file, "chatHistory.json");
    }

    #[test]
    fn test_history_paths_follow_storage_dir() {
        let mut config = Config::default();
        config.storage.dir = Some(PathBuf::from("/tmp/twin-test"));

        assert_eq!(
            config.history_path(),
            PathBuf::from("/tmp/twin-test/chatHistory.json")
        );
        assert_eq!(
            config.history_backup_path(),
            Some(PathBuf::from("/tmp/twin-test/chatHistory.backup.json"))
        );

        config.storage.backup = false;
        assert!(config.history_backup_path().is_none());
    }
}
