//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::DEFAULT_MODEL;

/// Environment variables checked for the API key, in order of preference.
pub const API_KEY_ENV_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Default generation settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Generative Language API key.
    pub api_key: Option<String>,
}

/// Default generation settings from the config file.
#[derive(Debug, Deserialize)]
pub struct DefaultsConfig {
    /// Default model name or alias.
    pub model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.to_string() }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the API key, preferring environment variables over the file.
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| non_blank(std::env::var(var).ok()))
            .or_else(|| non_blank(self.keys.api_key.clone()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `IMAGEN_STUDIO_CONFIG` environment variable
/// 3. `~/.config/imagen-studio/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("IMAGEN_STUDIO_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/imagen-studio/config.toml")
    } else {
        PathBuf::from("imagen-studio.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.api_key.is_none());
        assert_eq!(config.defaults.model, "imagen-3.0-generate-002");
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.defaults.model, DEFAULT_MODEL);
    }

    #[test]
    fn load_valid_toml() {
        let dir = std::env::temp_dir().join("imagen_studio_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
api_key = "test-key"

[defaults]
model = "imagen-4"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.defaults.model, "imagen-4");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_keys_only_keeps_default_model() {
        let dir = std::env::temp_dir().join("imagen_studio_config_partial_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[keys]\napi_key = \"k\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.defaults.model, DEFAULT_MODEL);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("imagen_studio_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    // The only test that touches the key variables.
    #[test]
    fn api_key_precedence() {
        let saved: Vec<_> =
            API_KEY_ENV_VARS.iter().map(|var| (*var, std::env::var(var).ok())).collect();
        let config = Config {
            keys: KeysConfig { api_key: Some("file-key".into()) },
            ..Config::default()
        };

        // Nothing in the environment: the file wins.
        std::env::remove_var("API_KEY");
        std::env::remove_var("GEMINI_API_KEY");
        assert_eq!(config.api_key().as_deref(), Some("file-key"));

        // Environment beats the file.
        std::env::set_var("GEMINI_API_KEY", "gemini-key");
        assert_eq!(config.api_key().as_deref(), Some("gemini-key"));

        // API_KEY beats GEMINI_API_KEY.
        std::env::set_var("API_KEY", "primary-key");
        assert_eq!(config.api_key().as_deref(), Some("primary-key"));

        // A blank API_KEY falls through to GEMINI_API_KEY.
        std::env::set_var("API_KEY", "");
        assert_eq!(config.api_key().as_deref(), Some("gemini-key"));

        // Blank environment values fall through to the file.
        std::env::set_var("GEMINI_API_KEY", "   ");
        assert_eq!(config.api_key().as_deref(), Some("file-key"));

        // Blank everywhere means no key.
        let blank_file =
            Config { keys: KeysConfig { api_key: Some(" ".into()) }, ..Config::default() };
        assert!(blank_file.api_key().is_none());
        assert!(Config::default().api_key().is_none());

        for (var, value) in saved {
            match value {
                Some(v) => std::env::set_var(var, v),
                None => std::env::remove_var(var),
            }
        }
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
