//! Configuration for the offline cache engine: version tag, routing
//! namespaces, asset manifest, HTTP client parameters and storage location,
//! loaded from YAML.

pub mod config;
pub mod http;

pub use config::{EngineConfig, HttpConfig, StorageConfig};
pub use http::{build_http_client, HttpClientParams};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
