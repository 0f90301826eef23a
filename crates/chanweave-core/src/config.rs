//! Project configuration
//!
//! Loaded from `chanweave.yaml` at the project root:
//!
//! ```yaml
//! name: pipelines
//! graphs_dir: graphs
//! output_dir: gen
//! codegen:
//!   format: true
//!   gofmt: gofmt
//!   go: go
//! store:
//!   save_timeout_ms: 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// File name looked up when a directory is given
pub const CONFIG_FILE: &str = "chanweave.yaml";

/// Root project configuration from `chanweave.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Directory holding graph JSON files, relative to the project root
    #[serde(default = "default_graphs_dir")]
    pub graphs_dir: String,

    /// Directory receiving generated Go packages
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Code generation settings
    #[serde(default)]
    pub codegen: CodegenConfig,

    /// Graph store settings
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_graphs_dir() -> String {
    "graphs".to_string()
}

fn default_output_dir() -> String {
    "gen".to_string()
}

/// Code generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Run gofmt over generated files
    #[serde(default = "default_format")]
    pub format: bool,

    /// gofmt executable
    #[serde(default = "default_gofmt")]
    pub gofmt: String,

    /// go executable
    #[serde(default = "default_go")]
    pub go: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            gofmt: default_gofmt(),
            go: default_go(),
        }
    }
}

fn default_format() -> bool {
    true
}

fn default_gofmt() -> String {
    "gofmt".to_string()
}

fn default_go() -> String {
    "go".to_string()
}

/// Graph store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound on a single save, in milliseconds
    #[serde(default = "default_save_timeout_ms")]
    pub save_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_timeout_ms: default_save_timeout_ms(),
        }
    }
}

fn default_save_timeout_ms() -> u64 {
    5000
}

impl StoreConfig {
    /// Save timeout as a duration
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory or a `chanweave.yaml` path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: ProjectConfig = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded configuration for project '{}'", project.name);

        Ok(Self { project, base_path })
    }

    /// Load configuration, falling back to defaults rooted at the would-be
    /// project directory when no file exists
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path.as_ref()) {
            Err(Error::ConfigNotFound { path: missing }) => {
                tracing::debug!("No configuration at {}, using defaults", missing);
                let base_path = if path.as_ref().is_dir() {
                    path.as_ref().to_path_buf()
                } else {
                    path.as_ref()
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .unwrap_or(Path::new("."))
                        .to_path_buf()
                };
                Ok(Self::with_defaults(base_path))
            }
            other => other,
        }
    }

    /// Default configuration rooted at `base_path`
    pub fn with_defaults(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        let name = base_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chanweave".to_string());
        let project = ProjectConfig {
            name,
            graphs_dir: default_graphs_dir(),
            output_dir: default_output_dir(),
            codegen: CodegenConfig::default(),
            store: StoreConfig::default(),
        };
        Self { project, base_path }
    }

    /// Absolute-ish directory holding graph files
    pub fn graphs_path(&self) -> PathBuf {
        self.base_path.join(&self.project.graphs_dir)
    }

    /// Directory receiving generated packages
    pub fn output_path(&self) -> PathBuf {
        self.base_path.join(&self.project.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: ProjectConfig = serde_yaml::from_str("name: pipes\n").unwrap();
        assert_eq!(config.graphs_dir, "graphs");
        assert_eq!(config.output_dir, "gen");
        assert!(config.codegen.format);
        assert_eq!(config.store.save_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: pipes
graphs_dir: g
output_dir: out
codegen:
  format: false
  gofmt: /usr/local/go/bin/gofmt
store:
  save_timeout_ms: 250
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.codegen.format);
        assert_eq!(config.codegen.gofmt, "/usr/local/go/bin/gofmt");
        assert_eq!(config.codegen.go, "go");
        assert_eq!(config.store.save_timeout_ms, 250);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: demo\ngraphs_dir: pipelines\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project.name, "demo");
        assert_eq!(config.graphs_path(), dir.path().join("pipelines"));
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));

        let config = Config::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.base_path, dir.path());
        assert_eq!(config.output_path(), dir.path().join("gen"));
    }
}
