//! Generate, build and run Go programs from graphs

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Stdio;

use chanweave_codegen::{GeneratedPackage, Generator, GeneratorOptions, Toolchain};

use super::{Workspace, package_dir};

/// Generate one graph, or every graph in the project
pub async fn generate(config_path: &str, graph: Option<&str>, out: Option<&str>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let generator = Generator::new(GeneratorOptions::from(&ws.config.project.codegen));

    let keys = match graph {
        Some(g) => vec![ws.load(g).await?],
        None => {
            if out.is_some() {
                anyhow::bail!("--out needs a single graph");
            }
            let keys = ws.discover();
            ws.store
                .load_all(&keys)
                .await
                .context("Failed to load graphs")?;
            keys
        }
    };

    for key in &keys {
        let (dir, package) = write(&ws, &generator, key, out).await?;
        tracing::info!(
            "✓ {} → {} ({} files, hash: {}...)",
            key,
            dir.display(),
            package.files.len(),
            &package.hash[..8]
        );
    }
    Ok(())
}

/// Generate and `go build` a graph
pub async fn build(config_path: &str, graph: &str, out: Option<&str>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let generator = Generator::new(GeneratorOptions::from(&ws.config.project.codegen));
    let key = ws.load(graph).await?;
    let (dir, package) = write(&ws, &generator, &key, out).await?;

    let binary = toolchain(&ws)
        .build(&dir, &package)
        .await
        .with_context(|| format!("Failed to build graph '{}'", graph))?;
    tracing::info!("✓ Built {}", binary.display());
    Ok(())
}

/// Generate and `go run` a graph
pub async fn run(config_path: &str, graph: &str, out: Option<&str>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let generator = Generator::new(GeneratorOptions::from(&ws.config.project.codegen));
    let key = ws.load(graph).await?;
    let (dir, package) = write(&ws, &generator, &key, out).await?;

    toolchain(&ws)
        .run(&dir, &package, Stdio::inherit(), Stdio::inherit())
        .await
        .with_context(|| format!("Failed to run graph '{}'", graph))?;
    Ok(())
}

fn toolchain(ws: &Workspace) -> Toolchain {
    Toolchain::new(ws.config.project.codegen.go.clone())
}

async fn write(
    ws: &Workspace,
    generator: &Generator,
    key: &str,
    out: Option<&str>,
) -> Result<(PathBuf, GeneratedPackage)> {
    let package = generator
        .generate_stored(&ws.store, key)
        .await
        .with_context(|| format!("Failed to generate {}", key))?;
    for diagnostic in &package.diagnostics {
        tracing::warn!("{}: {}", key, diagnostic);
    }

    let dir = package_dir(&ws.config, key, out);
    toolchain(ws)
        .write_package(&dir, &package)
        .await
        .with_context(|| format!("Failed to write package to {}", dir.display()))?;
    Ok((dir, package))
}
