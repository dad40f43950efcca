use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_static_extensions() -> Vec<String> {
    [
        ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff",
        ".woff2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("offsync/{}", env!("CARGO_PKG_VERSION"))
}

/// Engine configuration, typically loaded from a YAML file:
///
/// ```yaml
/// version: v2
/// api_prefix: /api/
/// manifest:
///   - https://app.example.com/
///   - https://app.example.com/index.html
///   - https://app.example.com/js/app.js
/// offline_page: https://app.example.com/offline.html
/// http:
///   timeout: 30
///   connect_timeout: 10
/// storage:
///   path: /var/lib/offsync
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Version tag of the current bucket generation. Bumped on deploy.
    pub version: String,
    /// Path prefix of the backend API namespace.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Extensions classified as static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,
    /// Absolute URLs seeded into the static bucket at install time.
    #[serde(default)]
    pub manifest: Vec<String>,
    /// Absolute URL of a pre-cached page served when a static asset is
    /// unreachable and uncached. Should appear in the manifest.
    #[serde(default)]
    pub offline_page: Option<String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Connect timeout, seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// On-disk keyspace location. `None` keeps store and queue in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            version = %config.version,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "version must not be empty".to_string(),
            ));
        }
        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "api_prefix must start with '/', got {:?}",
                self.api_prefix
            )));
        }
        if self.http.timeout == 0 || self.http.connect_timeout == 0 {
            return Err(ConfigError::Invalid(
                "http timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const YAML_FULL: &str = r#"
version: v2
api_prefix: /api/
static_extensions: [".css", ".js"]
manifest:
  - https://app.example.com/
  - https://app.example.com/js/app.js
offline_page: https://app.example.com/offline.html
http:
  timeout: 15
  connect_timeout: 5
  user_agent: finance-app/2.0
storage:
  path: /tmp/offsync-test
"#;

    const YAML_MINIMAL: &str = "version: v1\n";

    #[test]
    fn load_full_config() {
        let config = EngineConfig::from_yaml_str(YAML_FULL).unwrap();
        assert_eq!(config.version, "v2");
        assert_eq!(config.manifest.len(), 2);
        assert_eq!(
            config.offline_page.as_deref(),
            Some("https://app.example.com/offline.html")
        );
        assert_eq!(config.http.timeout, 15);
        assert_eq!(config.http.user_agent, "finance-app/2.0");
        assert_eq!(
            config.storage.path.as_deref(),
            Some(Path::new("/tmp/offsync-test"))
        );
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = EngineConfig::from_yaml_str(YAML_MINIMAL).unwrap();
        assert_eq!(config.api_prefix, "/api/");
        assert!(config.static_extensions.contains(&".woff2".to_string()));
        assert!(config.manifest.is_empty());
        assert!(config.offline_page.is_none());
        assert_eq!(config.http.timeout, 30);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.yml");
        let mut file = File::create(&path).unwrap();
        write!(file, "{YAML_FULL}").unwrap();

        let config = EngineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.version, "v2");
    }

    #[test]
    fn missing_file_is_io_error() {
        let res = EngineConfig::from_yaml_file("/does/not/exist.yml");
        assert!(matches!(res, Err(ConfigError::Io(_))));
    }

    #[test]
    fn invalid_yaml() {
        let res = EngineConfig::from_yaml_str("version: : v1 :");
        assert!(matches!(res, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn empty_version_rejected() {
        let res = EngineConfig::from_yaml_str("version: \"  \"\n");
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_api_prefix_rejected() {
        let res =
            EngineConfig::from_yaml_str("version: v1\napi_prefix: api/\n");
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timeout_rejected() {
        let res = EngineConfig::from_yaml_str(
            "version: v1\nhttp:\n  timeout: 0\n",
        );
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }
}
