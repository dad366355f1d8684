use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the assistant reaches a text generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiModeSetting {
    /// Run an external command line tool; the prompt is passed as the last argument
    Cli,
    /// Never call out; every request returns the fallback text
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    pub mode: AiModeSetting,
    /// Executable to run in `cli` mode. Looked up on PATH when not absolute
    pub command: String,
    /// Arguments placed before the prompt
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mode: AiModeSetting::Cli,
            command: "claude".to_string(),
            args: vec!["--print".to_string(), "-p".to_string()],
        }
    }
}

/// User configuration, stored as YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Session file holding the working state
    pub data_file: String,
    /// Directory for `backup export` when no output path is given
    pub backup_dir: String,
    /// Prefix of backup file names
    #[serde(default = "default_product_name")]
    pub product_name: String,
    /// Name of the holding used in assistant instructions
    #[serde(default = "default_holding_name")]
    pub holding_name: String,
    /// Seed new session files with the demo group
    #[serde(default)]
    pub seed_demo_data: bool,
    #[serde(default)]
    pub ai: AiConfig,
}

fn default_product_name() -> String {
    "rfx".to_string()
}

fn default_holding_name() -> String {
    "RFX Corp".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: "holding.json".to_string(),
            backup_dir: ".".to_string(),
            product_name: default_product_name(),
            holding_name: default_holding_name(),
            seed_demo_data: false,
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Save the configuration to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Creates a default config file if it doesn't exist
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Config::default().save(path)
    }

    /// Loads the file, or the defaults when there is none yet
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("HOLDING_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    // Default to ~/.holding.config
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".holding.config"))
}

/// Determines which session file to use.
///
/// Priority order:
/// 1. The `--file` flag
/// 2. The HOLDING_DATA_FILE environment variable
/// 3. holding.json in the current directory, if present
/// 4. `data_file` from the config
pub fn determine_data_path(file_flag: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(path) = file_flag {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var("HOLDING_DATA_FILE") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    let local = PathBuf::from("holding.json");
    if local.exists() {
        return local;
    }

    PathBuf::from(&config.data_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_default_then_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cfg").join(".holding.config");

        assert_eq!(Config::load_or_default(&path)?, Config::default());
        assert!(!path.exists());

        Config::create_default(&path)?;
        let config = Config::load(&path)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.product_name, "rfx");
        assert_eq!(config.ai.mode, AiModeSetting::Cli);
        Ok(())
    }

    #[test]
    fn test_create_default_keeps_existing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(".holding.config");

        let mut config = Config::default();
        config.backup_dir = "/srv/backups".into();
        config.save(&path)?;
        Config::create_default(&path)?;

        assert_eq!(Config::load(&path)?.backup_dir, "/srv/backups");
        Ok(())
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(".holding.config");
        fs::write(&path, "data_file: state.json\nbackup_dir: backups\n")?;

        let config = Config::load(&path)?;
        assert_eq!(config.data_file, "state.json");
        assert_eq!(config.holding_name, "RFX Corp");
        assert!(!config.seed_demo_data);
        assert_eq!(config.ai, AiConfig::default());
        Ok(())
    }

    #[test]
    fn test_disabled_ai_mode_parses() -> Result<()> {
        let yaml = "data_file: a.json\nbackup_dir: .\nai:\n  mode: disabled\n  command: none\n";
        let config: Config = serde_yaml::from_str(yaml)?;
        assert_eq!(config.ai.mode, AiModeSetting::Disabled);
        assert!(config.ai.args.is_empty());
        Ok(())
    }

    #[test]
    fn test_file_flag_wins() {
        let config = Config::default();
        let path = determine_data_path(Some(Path::new("/tmp/explicit.json")), &config);
        assert_eq!(path, PathBuf::from("/tmp/explicit.json"));
    }
}
