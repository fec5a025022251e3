//! Settings loading.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults ([`ClientSettings::default`])
//! 2. An optional TOML file
//! 3. `CLASSDESK_*` environment variables, e.g. `CLASSDESK_BASE_URL`

use std::collections::HashMap;
use std::path::PathBuf;

use classdesk_domain::{ClientSettings, DomainError};
use config::{Config, Environment, File, FileFormat};
use thiserror::Error;

/// Prefix of the environment variables read by [`SettingsLoader`].
pub const ENV_PREFIX: &str = "CLASSDESK";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or a value has the wrong type.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are invalid.
    #[error("invalid settings: {0}")]
    Invalid(#[from] DomainError),
}

/// Builds [`ClientSettings`] from a file and the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    /// Creates a loader reading only the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reads `path`, which must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Loads and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong
    /// type, or the result fails validation.
    pub fn load(&self) -> Result<ClientSettings, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(self.env.clone()),
        );

        let settings: ClientSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        tracing::debug!(
            base_url = %settings.base_url,
            namespace = %settings.storage_namespace,
            file = ?self.file,
            "settings loaded"
        );
        Ok(settings)
    }
}
