use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "calc_config.toml";
pub const CONFIG_PATH_ENV: &str = "CALC_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    /// Listen address for `serve`.
    pub bind: String,
    /// Name of the environment variable holding the Gemini API key.
    pub api_key_env: String,
    pub model: String,
    /// Base URL of the Gemini API, or a full `:generateContent` URL.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// Include simplifier steps in explanations.
    pub collect_steps: bool,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            model: calc_llm::DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: None,
            timeout_secs: calc_llm::DEFAULT_TIMEOUT.as_secs(),
            collect_steps: true,
        }
    }
}

impl CalcConfig {
    /// Load from `$CALC_CONFIG`, else `calc_config.toml`. Falls back to defaults
    /// when the file is missing or unreadable.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!(path = %path.display(), error = %e, "error parsing config file, using defaults"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "error reading config file, using defaults"),
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = CalcConfig::load_from(Path::new("/nonexistent/calc_config.toml"));
        assert_eq!(config, CalcConfig::default());
        assert_eq!(config.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_file("partial.toml", "bind = \"0.0.0.0:8080\"\ncollect_steps = false\n");
        let config = CalcConfig::load_from(&path);
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert!(!config.collect_steps);
        assert_eq!(config.model, "gemini-pro");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let path = temp_file("invalid.toml", "timeout_secs = \"soon\"");
        assert_eq!(CalcConfig::load_from(&path), CalcConfig::default());
        fs::remove_file(path).ok();
    }
}
