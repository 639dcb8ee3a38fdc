//! Configuration management for the sandbox

use crate::encoding::EncodingNormalizer;
use crate::error::SandboxError;
use crate::platform::{HostPlatform, ScriptPlatform};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`SandboxConfig::temp_dir`]
pub const TEMP_DIR_ENV: &str = "SNIPX_TEMP_DIR";

/// Environment variable overriding [`SandboxConfig::native_encoding`]
pub const NATIVE_ENCODING_ENV: &str = "SNIPX_NATIVE_ENCODING";

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory scripts are staged in (platform temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Label of the legacy narrow encoding subprocess output may arrive in
    /// (e.g. "windows-1252", "gbk"). Platform default when unset.
    #[serde(default)]
    pub native_encoding: Option<String>,

    /// How long after the child exits to keep reading pipes that are still
    /// held open; measured from the exit, not from the last output
    #[serde(default = "SandboxConfig::default_drain_grace", with = "humantime_serde")]
    pub drain_grace: Duration,

    /// Let child processes read the caller's stdin
    #[serde(default = "SandboxConfig::default_inherit_stdin")]
    pub inherit_stdin: bool,

    /// Interpreter program overrides
    #[serde(default)]
    pub programs: ProgramConfig,
}

/// Interpreter program overrides, one per shell variant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub bash: Option<String>,
    pub powershell: Option<String>,
    pub batch: Option<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            native_encoding: None,
            drain_grace: Self::default_drain_grace(),
            inherit_stdin: Self::default_inherit_stdin(),
            programs: ProgramConfig::default(),
        }
    }
}

impl SandboxConfig {
    fn default_drain_grace() -> Duration {
        Duration::from_millis(100)
    }

    fn default_inherit_stdin() -> bool {
        true
    }

    /// Load configuration from the default location, then apply
    /// environment overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SandboxError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SandboxError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SandboxError::Config("Cannot determine home directory".to_string()))?;

        Ok(home.join(".config").join("snipx").join("config.toml"))
    }

    /// Apply overrides from a key lookup (the process environment in [`Self::load`])
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(TEMP_DIR_ENV).filter(|v| !v.is_empty()) {
            self.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(label) = lookup(NATIVE_ENCODING_ENV).filter(|v| !v.is_empty()) {
            self.native_encoding = Some(label);
        }
    }

    /// Resolved staging directory
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Build the output normalizer for the configured (or platform) encoding
    pub fn normalizer(&self) -> Result<EncodingNormalizer> {
        match &self.native_encoding {
            Some(label) => EncodingNormalizer::for_label(label).ok_or_else(|| {
                SandboxError::Config(format!("Unknown native encoding: {}", label))
            }),
            None => Ok(EncodingNormalizer::new(
                HostPlatform::default().native_encoding(),
            )),
        }
    }
}
