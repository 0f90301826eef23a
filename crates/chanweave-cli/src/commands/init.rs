//! Initialize a new chanweave project

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;

use chanweave_core::api::{CreateChannel, CreateNode};
use chanweave_core::config::CONFIG_FILE;
use chanweave_core::{Graph, PartRegistry};

/// Run the init command
pub async fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let abs_path = project_dir.canonicalize()?;

    let project_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            CONFIG_FILE
        );
    }

    tracing::info!("Creating new chanweave project: {}", project_name);

    fs::create_dir_all(project_dir.join("graphs"))?;

    let config = format!(
        r#"# chanweave project configuration
name: {project_name}

# Graph files (JSON) live here
graphs_dir: graphs

# Generated Go packages are written here, one directory per graph
output_dir: gen

codegen:
  format: true
  gofmt: gofmt
  go: go

store:
  save_timeout_ms: 5000
"#
    );
    fs::write(project_dir.join(CONFIG_FILE), config)?;

    let example = example_graph().context("Failed to build example graph")?;
    fs::write(project_dir.join("graphs/hello.json"), example.to_json()?)?;

    let gitignore = r#"# Generated Go packages
gen/

# IDE
.idea/
.vscode/
*.swp
"#;
    fs::write(project_dir.join(".gitignore"), gitignore)?;

    tracing::info!(
        "✓ Created project '{}' at {}",
        project_name,
        abs_path.display()
    );
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  chanweave graph show hello    # Inspect the example graph");
    tracing::info!("  chanweave run hello           # Generate and run it");

    Ok(())
}

/// Numbers → Filter(even) → Printer, with odd numbers dropped
fn example_graph() -> chanweave_core::Result<Graph> {
    let registry = PartRegistry::builtin();
    let mut graph = Graph::new("hello", "example.com/hello", true);

    graph.create_node(
        &registry,
        CreateNode::new(
            "Numbers",
            "Code",
            json!({
                "body": "for i := 0; i < 10; i++ {\n\tnumbers <- i\n}",
                "pins": [{"name": "numbers", "type": "int", "direction": "output"}]
            }),
        ),
    )?;
    graph.create_node(
        &registry,
        CreateNode::new(
            "Even",
            "Filter",
            json!({"type": "int", "predicate": "v%2 == 0"}),
        ),
    )?;
    graph.create_node(
        &registry,
        CreateNode::new(
            "Printer",
            "Code",
            json!({
                "imports": ["fmt"],
                "body": "for v := range values {\n\tfmt.Println(v)\n}",
                "pins": [{"name": "values", "type": "int", "direction": "input"}]
            }),
        ),
    )?;
    graph.create_node(
        &registry,
        CreateNode::new("Discard", "Sink", json!({"type": "int"})),
    )?;

    for (name, from, to) in [
        ("numbers", ("Numbers", "numbers"), ("Even", "input")),
        ("evens", ("Even", "match"), ("Printer", "values")),
        ("odds", ("Even", "nomatch"), ("Discard", "input")),
    ] {
        graph.create_channel(CreateChannel {
            name: name.to_string(),
            ty: "int".to_string(),
            capacity: 0,
            anonymous: false,
            node1: from.0.to_string(),
            pin1: from.1.to_string(),
            node2: to.0.to_string(),
            pin2: to.1.to_string(),
        })?;
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_graph_is_consistent() {
        let graph = example_graph().unwrap();
        assert!(graph.check_consistency().is_empty());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.channel_count(), 3);
    }
}
