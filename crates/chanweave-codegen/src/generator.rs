//! Go source generation
//!
//! Lowers a consistent graph into a Go package:
//!
//! - one function per enabled node, taking one directional channel per pin
//! - an entry point (`main` for commands, `Run` for libraries) that allocates
//!   the live channels, merges fan-in channels and starts every node
//! - for libraries, a `run/main.go` runner that calls `Run`
//! - a `go.mod` naming the package path as the module
//!
//! Generation only reads the graph, and every collection it walks is ordered,
//! so the same graph always yields the same bytes.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use chanweave_core::parts::{go_string_literal, indent};
use chanweave_core::{Graph, GraphGenerator, GraphStore};

use crate::error::Result;
use crate::format::gofmt;
use crate::ident::package_name;
use crate::wiring::{ChannelWiring, NodeWiring, Wiring};

/// Go version written to `go.mod`
pub const GO_VERSION: &str = "1.22";

/// Runner directory of library packages
pub const RUNNER_DIR: &str = "run";

const PACKAGE_TEMPLATE: &str = include_str!("../templates/package.go.j2");
const RUNNER_TEMPLATE: &str = include_str!("../templates/runner.go.j2");
const GO_MOD_TEMPLATE: &str = include_str!("../templates/go.mod.j2");

/// Options for the generator
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Run gofmt over generated Go files
    pub format: bool,

    /// gofmt executable
    pub gofmt: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            format: true,
            gofmt: "gofmt".to_string(),
        }
    }
}

impl From<&chanweave_core::config::CodegenConfig> for GeneratorOptions {
    fn from(config: &chanweave_core::config::CodegenConfig) -> Self {
        Self {
            format: config.format,
            gofmt: config.gofmt.clone(),
        }
    }
}

/// A generated Go package
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPackage {
    /// Go package name
    pub package_name: String,

    /// Module path written to `go.mod`
    pub module: String,

    /// Whether the package is a command
    pub is_command: bool,

    /// File path (relative to the package root) → contents
    pub files: BTreeMap<String, String>,

    /// Warnings collected while generating and formatting
    pub diagnostics: Vec<String>,

    /// SHA-256 over the file names and contents
    pub hash: String,
}

impl GeneratedPackage {
    /// Name of the file holding the node functions and entry point
    pub fn main_file(&self) -> String {
        if self.is_command {
            "main.go".to_string()
        } else {
            format!("{}.go", self.package_name)
        }
    }

    /// Package directory `go build` and `go run` target, relative to the root
    pub fn command_dir(&self) -> String {
        if self.is_command {
            ".".to_string()
        } else {
            format!("./{}", RUNNER_DIR)
        }
    }

    /// Source of the main file
    pub fn source(&self) -> &str {
        self.files
            .get(&self.main_file())
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn rehash(&mut self) {
        let mut hasher = Sha256::new();
        for (name, contents) in &self.files {
            hasher.update(name.as_bytes());
            hasher.update([0]);
            hasher.update(contents.as_bytes());
            hasher.update([0]);
        }
        self.hash = hex::encode(hasher.finalize());
    }
}

#[derive(Serialize)]
struct NodeContext {
    ident: String,
    quoted_name: String,
    part_type: &'static str,
    params: String,
    args: String,
    multiplicity: u32,
    wait: bool,
    head: String,
    body: String,
    tail: String,
    closes: Vec<String>,
}

#[derive(Serialize)]
struct ChannelContext {
    ident: String,
    ty: String,
    capacity: u32,
    writers: Vec<String>,
    merge_sources: String,
}

impl From<&ChannelWiring> for ChannelContext {
    fn from(ch: &ChannelWiring) -> Self {
        Self {
            ident: ch.ident.clone(),
            ty: ch.ty.clone(),
            capacity: ch.capacity,
            writers: ch.writers.clone(),
            merge_sources: format!("[]chan {}{{{}}}", ch.ty, ch.writers.join(", ")),
        }
    }
}

#[derive(Serialize)]
struct PackageContext {
    graph_name: String,
    package: String,
    imports: Vec<String>,
    support_code: Vec<String>,
    nodes: Vec<NodeContext>,
    channels: Vec<ChannelContext>,
    entry: &'static str,
}

/// Go code generator
pub struct Generator {
    env: Environment<'static>,
    options: GeneratorOptions,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorOptions::default())
    }
}

impl Generator {
    /// Create a generator with the given options
    pub fn new(options: GeneratorOptions) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        for (name, source) in [
            ("package.go", PACKAGE_TEMPLATE),
            ("runner.go", RUNNER_TEMPLATE),
            ("go.mod", GO_MOD_TEMPLATE),
        ] {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!("Invalid built-in template {}: {}", name, e);
            }
        }
        Self { env, options }
    }

    /// Options in effect
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render the package without formatting
    pub fn render(&self, graph: &Graph) -> Result<GeneratedPackage> {
        graph.ensure_consistent()?;

        let wiring = Wiring::of(graph);
        let mut diagnostics = Vec::new();
        let mut imports: BTreeSet<String> = BTreeSet::from(["sync".to_string()]);
        let mut support: BTreeMap<String, String> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(wiring.nodes.len());

        for disabled in graph.nodes().filter(|n| !n.enabled) {
            tracing::debug!("Skipping disabled node {}", disabled.name);
        }

        for nw in &wiring.nodes {
            let Some(node) = graph.node(&nw.name) else {
                continue;
            };
            imports.extend(node.part.imports());
            if let Some(sc) = node.part.support_code() {
                support.entry(sc.key).or_insert(sc.code);
            }
            if !node.wait {
                let message = format!(
                    "node '{}' has wait=false; the entry point returns without waiting for it",
                    node.name
                );
                tracing::warn!("{}", message);
                diagnostics.push(message);
            }
            nodes.push(node_context(nw, node));
        }

        let name = if graph.is_command {
            "main".to_string()
        } else {
            package_name(&graph.package_path)
        };
        let module = if graph.package_path.trim().is_empty() {
            package_name(&graph.name)
        } else {
            graph.package_path.trim().to_string()
        };
        let graph_name = go_string_literal(&graph.name);

        let context = PackageContext {
            graph_name: graph_name.clone(),
            package: name.clone(),
            imports: imports.into_iter().collect(),
            support_code: support.into_values().collect(),
            nodes,
            channels: wiring.channels.iter().map(ChannelContext::from).collect(),
            entry: if graph.is_command { "main" } else { "Run" },
        };

        let mut package = GeneratedPackage {
            package_name: name,
            module: module.clone(),
            is_command: graph.is_command,
            files: BTreeMap::new(),
            diagnostics,
            hash: String::new(),
        };

        let source = self.env.get_template("package.go")?.render(&context)?;
        package.files.insert(package.main_file(), source);

        if !graph.is_command {
            let runner = self.env.get_template("runner.go")?.render(minijinja::context! {
                graph_name => graph_name,
                package_path => module,
            })?;
            package
                .files
                .insert(format!("{}/main.go", RUNNER_DIR), runner);
        }

        let go_mod = self.env.get_template("go.mod")?.render(minijinja::context! {
            module => &package.module,
            go_version => GO_VERSION,
        })?;
        package.files.insert("go.mod".to_string(), go_mod);

        package.rehash();
        tracing::debug!(
            "Generated {} files for graph {} ({})",
            package.files.len(),
            graph.name,
            package.hash
        );
        Ok(package)
    }

    /// Run gofmt over the Go files if enabled.
    ///
    /// A file gofmt rejects is kept unformatted and a diagnostic recorded.
    pub async fn format(&self, mut package: GeneratedPackage) -> GeneratedPackage {
        if !self.options.format {
            return package;
        }
        for (name, contents) in package.files.iter_mut() {
            if !name.ends_with(".go") {
                continue;
            }
            match gofmt(&self.options.gofmt, name, contents).await {
                Ok(formatted) => *contents = formatted,
                Err(e) => {
                    tracing::warn!("Keeping {} unformatted: {}", name, e);
                    package.diagnostics.push(e.to_string());
                }
            }
        }
        package.rehash();
        package
    }

    /// Render and format
    pub async fn generate(&self, graph: &Graph) -> Result<GeneratedPackage> {
        let package = self.render(graph)?;
        Ok(self.format(package).await)
    }

    /// Render a stored graph while holding its lock, then format
    pub async fn generate_stored(&self, store: &GraphStore, key: &str) -> Result<GeneratedPackage> {
        let package = store.generate(key, self).await??;
        Ok(self.format(package).await)
    }
}

impl GraphGenerator for Generator {
    type Output = Result<GeneratedPackage>;

    fn generate(&self, graph: &Graph) -> Self::Output {
        self.render(graph)
    }
}

fn node_context(nw: &NodeWiring, node: &chanweave_core::Node) -> NodeContext {
    let implementation = node.part.implementation(&nw.bindings);
    NodeContext {
        ident: nw.ident.clone(),
        quoted_name: go_string_literal(&nw.name),
        part_type: node.part.type_key(),
        params: nw
            .params
            .iter()
            .map(|p| p.declaration())
            .collect::<Vec<_>>()
            .join(", "),
        args: nw
            .params
            .iter()
            .map(|p| p.argument())
            .collect::<Vec<_>>()
            .join(", "),
        multiplicity: node.multiplicity,
        wait: node.wait,
        head: indent(implementation.head.trim_end(), 1),
        body: indent(implementation.body.trim_end(), 3),
        tail: indent(implementation.tail.trim_end(), 1),
        closes: nw.closes().map(str::to_string).collect(),
    }
}
