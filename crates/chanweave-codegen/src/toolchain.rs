//! Go toolchain adapter
//!
//! Writes generated packages to disk and drives `go build` / `go run` on them.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::generator::GeneratedPackage;

/// Directory, relative to the package root, receiving built binaries
pub const BIN_DIR: &str = "bin";

/// Wrapper around the `go` executable
#[derive(Debug, Clone)]
pub struct Toolchain {
    go: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Toolchain {
    /// Use the given `go` executable
    pub fn new(go: impl Into<String>) -> Self {
        Self { go: go.into() }
    }

    /// Write every file of the package below `dir`, returning the written paths
    pub async fn write_package(
        &self,
        dir: impl AsRef<Path>,
        package: &GeneratedPackage,
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::with_capacity(package.files.len());
        for (name, contents) in &package.files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, contents).await?;
            tracing::debug!("Wrote {}", path.display());
            written.push(path);
        }
        tracing::info!(
            "Wrote package {} to {} ({})",
            package.package_name,
            dir.display(),
            package.hash
        );
        Ok(written)
    }

    /// Check that the toolchain can be started, returning `go version` output
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.go)
            .arg("version")
            .output()
            .await
            .map_err(|e| Error::Toolchain {
                message: format!("Failed to run {}: {}", self.go, e),
            })?;
        if !output.status.success() {
            return Err(Error::Toolchain {
                message: format!(
                    "{} version exited with {}: {}",
                    self.go,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Build the package's command into `dir/bin`, returning the binary path
    pub async fn build(&self, dir: impl AsRef<Path>, package: &GeneratedPackage) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let binary = dir.join(BIN_DIR).join(binary_name(package));
        tracing::debug!("Running go build in {}", dir.display());

        let output = Command::new(&self.go)
            .current_dir(dir)
            .arg("build")
            .arg("-o")
            .arg(&binary)
            .arg(package.command_dir())
            .output()
            .await
            .map_err(|e| Error::Toolchain {
                message: format!("Failed to run {}: {}", self.go, e),
            })?;

        if !output.status.success() {
            return Err(Error::Build {
                command: "build".to_string(),
                message: format!("could not build {}", package.module),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        tracing::info!("Built {}", binary.display());
        Ok(binary)
    }

    /// `go run` the package's command with the given output streams
    pub async fn run(
        &self,
        dir: impl AsRef<Path>,
        package: &GeneratedPackage,
        stdout: Stdio,
        stderr: Stdio,
    ) -> Result<ExitStatus> {
        let dir = dir.as_ref();
        tracing::debug!("Running go run in {}", dir.display());

        let status = Command::new(&self.go)
            .current_dir(dir)
            .arg("run")
            .arg(package.command_dir())
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .map_err(|e| Error::Toolchain {
                message: format!("Failed to run {}: {}", self.go, e),
            })?;

        if !status.success() {
            return Err(Error::Build {
                command: "run".to_string(),
                message: format!("{} exited with {}", package.module, status),
                stderr: None,
            });
        }
        Ok(status)
    }
}

/// File name of the built command
pub fn binary_name(package: &GeneratedPackage) -> String {
    let base = package
        .module
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(&package.package_name);
    if cfg!(windows) {
        format!("{}.exe", base)
    } else {
        base.to_string()
    }
}
