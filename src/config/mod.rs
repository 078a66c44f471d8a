use crate::models::RigConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the rig configuration inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "rigpanel.yaml";

/// Prefix for environment overrides, e.g. `RIGPANEL__SERIAL__PORT=/dev/ttyACM0`.
pub const ENV_PREFIX: &str = "RIGPANEL";

/// Configuration manager for loading and saving the rig configuration.
///
/// Values are layered in this order, later sources winning:
/// - built-in defaults
/// - `rigpanel.yaml` in the configuration directory (optional)
/// - `RIGPANEL__<SECTION>__<KEY>` environment variables
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `rigpanel.yaml` (e.g., "RigPanel Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the rig configuration.
    ///
    /// A missing file is not an error; defaults (plus any environment
    /// overrides) are returned instead.
    pub fn load_config(&self) -> Result<RigConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let layered = config::Config::builder()
            .add_source(
                config::File::from(self.config_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: RigConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded rig config from {}", self.config_dir);
        Ok(config)
    }

    /// Save the rig configuration as YAML.
    pub fn save_config(&self, config: &RigConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize rig config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write rig config: {}", self.config_path))?;

        tracing::info!("Saved rig config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
