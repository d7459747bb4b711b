use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::resolve::DEFAULT_EXTENSION;
use crate::writer::DEFAULT_DIR_NAME;

/// Contents of `treeshake.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Emitter threads
    pub jobs: usize,
    /// Record failing dependencies instead of aborting
    pub keep_going: bool,
    pub output: OutputConfig,
    pub resolve: ResolveConfig,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            keep_going: false,
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory created next to each module for its pruned copy
    pub dir_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_DIR_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Appended to relative import specifiers
    pub extension: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("treeshake.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ShakeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ShakeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ShakeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("treeshake.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("treeshake.toml");
        std::fs::write(&path, "jobs = 4\n\n[output]\ndir_name = \"dist\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.jobs, 4);
        assert!(!config.keep_going);
        assert_eq!(config.output.dir_name, "dist");
        assert_eq!(config.resolve.extension, ".js");
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("treeshake.toml");
        let config = ShakeConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));
    }
}
