//! Configuration Manager

use super::types::*;
use crate::Result;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// Manages settings loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load settings from a TOML file, falling back to defaults if it is missing
    ///
    /// The file is only parsed here. Validation runs once every layer has
    /// been merged, so a bad file value can still be overridden.
    pub fn load_from_file(path: &Path) -> Result<Settings> {
        if path.exists() {
            tracing::info!("Loading settings from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

            tracing::info!("Settings file parsed successfully");
            Ok(settings)
        } else {
            tracing::warn!("Settings file not found at {}, using defaults", path.display());
            Ok(Settings::default())
        }
    }

    /// Load settings from the process environment
    pub fn load_from_env() -> Result<Settings> {
        Self::load_from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary variable lookup
    pub fn load_from_lookup<F>(lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        settings.merge_env(lookup);
        settings.validate()?;
        Ok(settings)
    }
}

/// Empty values count as unset.
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            tracing::debug!("{} not set, keeping current value", name);
            None
        }
    }
}

impl Settings {
    /// Override fields with any environment variables that are set
    pub fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(consul) = non_empty(&lookup, ENV_CONSUL) {
            self.consul = consul;
        }

        if let Some(tag) = non_empty(&lookup, ENV_SERVICE_TAG) {
            self.service_tag = tag;
        }

        if let Some(dir) = non_empty(&lookup, ENV_VCL_DIR) {
            self.vcl.dir = PathBuf::from(dir);
        }

        if let Some(level) = non_empty(&lookup, ENV_LOG_LEVEL) {
            self.log.level = level;
        }
    }

    /// Validate the settings
    ///
    /// Only the agent's own settings are hard errors. The discovery values
    /// are passed through as given; see [`Settings::discovery_warnings`].
    pub fn validate(&self) -> Result<()> {
        if self.vcl.dir.as_os_str().is_empty() {
            bail!("vcl.dir must not be empty");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log.level.as_str()) {
            bail!("log.level must be one of: {}", valid_log_levels.join(", "));
        }

        for warning in self.discovery_warnings() {
            tracing::warn!("{}", warning);
        }

        Ok(())
    }

    /// Suspicious consul / service tag values. Never fatal.
    pub fn discovery_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let rest = self
            .consul
            .strip_prefix("http://")
            .or_else(|| self.consul.strip_prefix("https://"));
        match rest {
            None => warnings.push(format!(
                "consul address {:?} has no http:// or https:// scheme",
                self.consul
            )),
            Some(rest) if rest.split('/').next().unwrap_or_default().is_empty() => {
                warnings.push(format!("consul address {:?} has no host", self.consul))
            }
            Some(_) => {}
        }

        if self.service_tag.is_empty() {
            warnings.push("service tag is empty".to_string());
        } else if self.service_tag.chars().any(char::is_whitespace) {
            warnings.push(format!("service tag {:?} contains whitespace", self.service_tag));
        }

        warnings
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        consul: Option<&str>,
        service_tag: Option<&str>,
        vcl_dir: Option<&Path>,
        log_level: Option<&str>,
    ) {
        if let Some(consul) = consul {
            self.consul = consul.to_string();
            tracing::info!("CLI override: consul set to {}", consul);
        }

        if let Some(tag) = service_tag {
            self.service_tag = tag.to_string();
            tracing::info!("CLI override: service tag set to {}", tag);
        }

        if let Some(dir) = vcl_dir {
            self.vcl.dir = dir.to_path_buf();
            tracing::info!("CLI override: vcl dir set to {}", dir.display());
        }

        if let Some(level) = log_level {
            self.log.level = level.to_string();
            tracing::info!("CLI override: log level set to {}", level);
        }
    }
}
