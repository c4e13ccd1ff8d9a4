use std::path::{Path, PathBuf};

use anyhow::Context;
use chanlog_core::CoreConfig;
use serde::{Deserialize, Serialize};

/// Settings read from `--config`, or defaults when no file is given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding content-addressed objects.
    pub data_dir: PathBuf,
    /// Head pointer file. Without one, channels start empty on every run.
    pub cache_file: Option<PathBuf>,
    /// Shared secret required for every channel.
    pub password: Option<String>,
    /// Default acting user.
    pub user: Option<String>,
    pub core: CoreConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".chanlog/objects"),
            cache_file: Some(PathBuf::from(".chanlog/heads.json")),
            password: None,
            user: None,
            core: CoreConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("invalid configuration")?;
        config.core.validate()?;
        Ok(config)
    }

    /// Load `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read config {}", path.display()))?;
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert_eq!(c.data_dir, PathBuf::from(".chanlog/objects"));
        assert_eq!(c.cache_file, Some(PathBuf::from(".chanlog/heads.json")));
        assert!(c.password.is_none());
        assert_eq!(c.core, CoreConfig::default());
    }

    #[test]
    fn parse_full_file() {
        let c = CliConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/chanlog"
            cache_file = "/var/lib/chanlog/heads.json"
            password = "s3cret"
            user = "alice"

            [core]
            fetch_concurrency = 8
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/chanlog"));
        assert_eq!(c.password.as_deref(), Some("s3cret"));
        assert_eq!(c.user.as_deref(), Some("alice"));
        assert_eq!(c.core.fetch_concurrency, 8);
        assert_eq!(c.core.event_capacity, CoreConfig::default().event_capacity);
    }

    #[test]
    fn invalid_core_section_rejected() {
        assert!(CliConfig::from_toml_str("[core]\nfetch_concurrency = 0").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chanlog.toml");
        std::fs::write(&path, "user = \"bob\"").unwrap();
        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.user.as_deref(), Some("bob"));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }
}
