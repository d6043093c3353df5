//! Configuration for the container.
//!
//! [`ArtisanConfig`] carries the base directory root registrations resolve
//! against, the entry unit name discovery looks for, and the policy for
//! call-scoped overrides.

use std::path::{Path, PathBuf};

/// Base trait for configuration types.
///
/// # Example
///
/// ```rust
/// use artisan::Config;
///
/// #[derive(Debug, Clone)]
/// struct PoolConfig {
///     size: u32,
/// }
///
/// impl Config for PoolConfig {
///     fn name(&self) -> &str {
///         "pool"
///     }
///
///     fn validate(&self) -> Result<(), String> {
///         if self.size == 0 {
///             return Err("size must be greater than 0".to_string());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Config {
    /// Returns the configuration name/identifier.
    fn name(&self) -> &str {
        "default"
    }

    /// Validates the configuration.
    ///
    /// Returns Ok(()) if valid, or an error message describing the issue.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// What happens to a value computed with call-scoped overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverridePolicy {
    /// The result is returned to the caller only; caches are untouched.
    #[default]
    Scoped,
    /// The result is memoized like any other evaluation until the next reset.
    Persist,
}

/// Container configuration.
#[derive(Debug, Clone)]
pub struct ArtisanConfig {
    /// Configuration name
    pub name: String,
    /// Directory root-level registrations are resolved against
    pub base: PathBuf,
    /// File name of the entry unit inside a provider directory
    pub entry: String,
    /// Handling of call-scoped overrides
    pub overrides: OverridePolicy,
}

impl Default for ArtisanConfig {
    fn default() -> Self {
        Self {
            name: "artisan".to_string(),
            base: PathBuf::new(),
            entry: "index".to_string(),
            overrides: OverridePolicy::default(),
        }
    }
}

impl ArtisanConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the base directory.
    pub fn with_base(mut self, base: impl AsRef<Path>) -> Self {
        self.base = base.as_ref().to_path_buf();
        self
    }

    /// Set the entry unit name.
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Set the override policy.
    pub fn with_overrides(mut self, policy: OverridePolicy) -> Self {
        self.overrides = policy;
        self
    }
}

impl Config for ArtisanConfig {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "artisan"
        } else {
            &self.name
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.entry.is_empty() {
            return Err("entry unit name must not be empty".to_string());
        }
        if self.entry.contains(['/', '\\']) {
            return Err(format!(
                "entry unit name `{}` must not contain a path separator",
                self.entry
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArtisanConfig::new();

        assert_eq!(config.name(), "artisan");
        assert_eq!(config.base, PathBuf::new());
        assert_eq!(config.entry, "index");
        assert_eq!(config.overrides, OverridePolicy::Scoped);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = ArtisanConfig::new()
            .with_name("app")
            .with_base("providers")
            .with_entry("provider.toml")
            .with_overrides(OverridePolicy::Persist);

        assert_eq!(config.name(), "app");
        assert_eq!(config.base, PathBuf::from("providers"));
        assert_eq!(config.entry, "provider.toml");
        assert_eq!(config.overrides, OverridePolicy::Persist);
    }

    #[test]
    fn test_config_validation() {
        assert!(ArtisanConfig::new().with_entry("").validate().is_err());
        assert!(ArtisanConfig::new().with_entry("a/index").validate().is_err());
        assert_eq!(ArtisanConfig::new().with_name("").name(), "artisan");
    }
}
