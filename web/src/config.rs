use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};
use std::{collections::HashMap, path::Path};
use tracing::debug;

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListenConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

const DEFAULT_HTTP_PORT: u16 = 3333;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

fn default_listen() -> ListenConfig {
    ListenConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_HTTP_PORT,
    }
}

fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}

fn default_max_upload_size() -> usize {
    DEFAULT_MAX_UPLOAD_SIZE
}

// This handles the case where the `listen` block is PRESENT, but a field may be missing.
fn deserialize_listen_with_defaults<'de, D>(deserializer: D) -> Result<ListenConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct PartialListenConfig {
        host: Option<String>,
        port: Option<u16>,
    }

    let partial_config = PartialListenConfig::deserialize(deserializer)?;
    Ok(ListenConfig {
        host: partial_config
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: partial_config.port.unwrap_or(DEFAULT_HTTP_PORT),
    })
}

/// The configuration for a single named environment (e.g. `dev` or `prod`)
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default = "default_listen")]
    #[serde(deserialize_with = "deserialize_listen_with_defaults")]
    pub(crate) listen: ListenConfig,
    pub(crate) database: String,
    /// directory where uploaded location images are stored and served from
    #[serde(default = "default_upload_dir")]
    pub(crate) upload_dir: String,
    /// maximum size of a request body in bytes, which bounds image uploads
    #[serde(default = "default_max_upload_size")]
    pub(crate) max_upload_size: usize,
}

impl EnvConfig {
    /// Parse a yaml document that maps environment names to configurations
    /// and pick out the one named `envname`
    pub(crate) fn from_yaml(yaml: &str, envname: &str) -> Result<Self> {
        let mut configs: HashMap<String, EnvConfig> =
            serde_yaml::from_str(yaml).with_context(|| "Failed to parse configuration")?;
        debug!(
            "Found configurations for environments {:?}",
            configs.keys().collect::<Vec<_>>()
        );
        configs
            .remove(envname)
            .ok_or_else(|| anyhow!("No configuration found for environment '{envname}'"))
    }

    pub(crate) fn load<P: AsRef<Path>>(path: P, envname: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {path:?}");
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {path:?}"))?;
        Self::from_yaml(&yaml, envname)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"dev:
  database: dev-database.sqlite
  listen: &LISTEN
    host: "127.0.0.1"
    port: 8080
  upload_dir: "/tmp/uploads"
prod:
  database: prod-database.sqlite
  listen: *LISTEN
  max_upload_size: 1024"#;
        let dev = EnvConfig::from_yaml(yaml, "dev").expect("Failed to parse dev config");
        assert_eq!(
            dev,
            EnvConfig {
                listen: ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                database: "dev-database.sqlite".to_string(),
                upload_dir: "/tmp/uploads".to_string(),
                max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            }
        );
        let prod = EnvConfig::from_yaml(yaml, "prod").expect("Failed to parse prod config");
        assert_eq!(
            prod,
            EnvConfig {
                listen: ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                database: "prod-database.sqlite".to_string(),
                upload_dir: "uploads".to_string(),
                max_upload_size: 1024,
            }
        );
        assert!(EnvConfig::from_yaml(yaml, "staging").is_err());
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"dev:
  database: dev-database.sqlite
  listen:
    host: "127.0.0.1""#;
        let dev = EnvConfig::from_yaml(yaml, "dev").expect("Failed to parse config");
        assert_eq!(dev.listen.port, 3333);
        assert_eq!(dev.upload_dir, "uploads");

        let yaml = r#"dev:
  database: dev-database.sqlite"#;
        let dev = EnvConfig::from_yaml(yaml, "dev").expect("Failed to parse config");
        assert_eq!(dev.listen, default_listen());
    }

    #[test]
    fn test_unknown_fields() {
        let yaml = r#"dev:
  database: dev-database.sqlite
  mail_service: "nope""#;
        assert!(EnvConfig::from_yaml(yaml, "dev").is_err());
    }
}
