//! List the available part types

use anyhow::Result;

use chanweave_core::PartRegistry;

/// Run the parts command
pub async fn run() -> Result<()> {
    let registry = PartRegistry::builtin();
    let width = registry
        .entries()
        .map(|e| e.type_key.len())
        .max()
        .unwrap_or(0);
    for entry in registry.entries() {
        println!("{:width$}  {}", entry.type_key, entry.description, width = width);
    }
    Ok(())
}
