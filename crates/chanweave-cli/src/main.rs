//! chanweave CLI
//!
//! Edit pipeline graphs, then generate, build and run them as Go programs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// chanweave - concurrent pipelines as graphs, compiled to Go
#[derive(Parser)]
#[command(name = "chanweave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file or project directory
    #[arg(short, long, default_value = "chanweave.yaml", env = "CHANWEAVE_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new chanweave project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Manage graphs
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Manage nodes
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Manage channels
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },

    /// Connect and disconnect pins
    Pin {
        #[command(subcommand)]
        command: PinCommands,
    },

    /// Apply JSON-lines requests to a graph
    Apply {
        /// Graph name
        graph: String,

        /// Request file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Generate Go packages
    Generate {
        /// Generate a specific graph only
        graph: Option<String>,

        /// Output directory (single graph only)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Generate and build a graph with go build
    Build {
        /// Graph name
        graph: String,

        /// Output directory
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Generate and run a graph with go run
    Run {
        /// Graph name
        graph: String,

        /// Output directory
        #[arg(short, long)]
        out: Option<String>,
    },

    /// List the available part types
    Parts,
}

#[derive(Subcommand)]
enum GraphCommands {
    /// Create an empty graph
    New {
        /// Graph name
        graph: String,

        /// Go package path (defaults to example.com/<graph>)
        #[arg(short, long)]
        package_path: Option<String>,

        /// Generate a command (package main) instead of a library
        #[arg(long)]
        command: bool,
    },

    /// Show a graph
    Show {
        /// Graph name
        graph: String,

        /// Print the graph file instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Change graph properties
    Set {
        /// Graph name
        graph: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New Go package path
        #[arg(short, long)]
        package_path: Option<String>,

        /// Generate a command (true) or a library (false)
        #[arg(long)]
        command: Option<bool>,
    },

    /// Verify graphs load and are consistent
    Check {
        /// Check a specific graph only
        graph: Option<String>,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Add a node
    Add {
        /// Graph name
        graph: String,

        /// Node name
        name: String,

        /// Part type (see `chanweave parts`)
        part_type: String,

        /// Part configuration as JSON
        #[arg(short, long)]
        part: Option<String>,

        /// Concurrent body instances
        #[arg(short, long, default_value_t = 1)]
        multiplicity: u32,

        /// Create the node disabled
        #[arg(long)]
        disabled: bool,

        /// Do not wait for this node before exiting
        #[arg(long)]
        no_wait: bool,

        /// Layout x
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i64,

        /// Layout y
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        y: i64,
    },

    /// Remove a node
    Rm {
        /// Graph name
        graph: String,

        /// Node name
        name: String,
    },

    /// Change node properties
    Set {
        /// Graph name
        graph: String,

        /// Node name
        name: String,

        /// New node name
        #[arg(long)]
        rename: Option<String>,

        /// New part type
        #[arg(long)]
        part_type: Option<String>,

        /// New part configuration as JSON
        #[arg(short, long)]
        part: Option<String>,

        /// Enable or disable the node
        #[arg(long)]
        enabled: Option<bool>,

        /// Wait for the node before exiting
        #[arg(long)]
        wait: Option<bool>,

        /// Concurrent body instances
        #[arg(short, long)]
        multiplicity: Option<u32>,
    },

    /// Move a node
    Move {
        /// Graph name
        graph: String,

        /// Node name
        name: String,

        /// Layout x
        #[arg(allow_hyphen_values = true)]
        x: i64,

        /// Layout y
        #[arg(allow_hyphen_values = true)]
        y: i64,
    },
}

#[derive(Subcommand)]
enum ChannelCommands {
    /// Create a channel between two pins
    Add {
        /// Graph name
        graph: String,

        /// Channel name
        name: String,

        /// First pin as NODE.PIN
        from: String,

        /// Second pin as NODE.PIN
        to: String,

        /// Go element type
        #[arg(short = 't', long = "type")]
        ty: String,

        /// Buffer capacity
        #[arg(long, default_value_t = 0)]
        cap: u32,
    },

    /// Delete a channel
    Rm {
        /// Graph name
        graph: String,

        /// Channel name
        name: String,
    },
}

#[derive(Subcommand)]
enum PinCommands {
    /// Attach a pin to an existing channel
    Connect {
        /// Graph name
        graph: String,

        /// Pin as NODE.PIN
        pin: String,

        /// Channel name
        channel: String,
    },

    /// Detach a pin from its channel
    Disconnect {
        /// Graph name
        graph: String,

        /// Pin as NODE.PIN
        pin: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_str();
    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref()).await?;
        }
        Commands::Graph { command } => match command {
            GraphCommands::New {
                graph,
                package_path,
                command,
            } => {
                commands::graph::new(config, &graph, package_path.as_deref(), command).await?;
            }
            GraphCommands::Show { graph, json } => {
                commands::graph::show(config, &graph, json).await?;
            }
            GraphCommands::Set {
                graph,
                name,
                package_path,
                command,
            } => {
                commands::graph::set(
                    config,
                    &graph,
                    name.as_deref(),
                    package_path.as_deref(),
                    command,
                )
                .await?;
            }
            GraphCommands::Check { graph } => {
                commands::graph::check(config, graph.as_deref()).await?;
            }
        },
        Commands::Node { command } => match command {
            NodeCommands::Add {
                graph,
                name,
                part_type,
                part,
                multiplicity,
                disabled,
                no_wait,
                x,
                y,
            } => {
                let options = commands::node::AddOptions {
                    part: part.as_deref(),
                    multiplicity,
                    disabled,
                    no_wait,
                    x,
                    y,
                };
                commands::node::add(config, &graph, &name, &part_type, options).await?;
            }
            NodeCommands::Rm { graph, name } => {
                commands::node::rm(config, &graph, &name).await?;
            }
            NodeCommands::Set {
                graph,
                name,
                rename,
                part_type,
                part,
                enabled,
                wait,
                multiplicity,
            } => {
                let options = commands::node::SetOptions {
                    rename: rename.as_deref(),
                    part_type: part_type.as_deref(),
                    part: part.as_deref(),
                    enabled,
                    wait,
                    multiplicity,
                };
                commands::node::set(config, &graph, &name, options).await?;
            }
            NodeCommands::Move { graph, name, x, y } => {
                commands::node::move_to(config, &graph, &name, x, y).await?;
            }
        },
        Commands::Channel { command } => match command {
            ChannelCommands::Add {
                graph,
                name,
                from,
                to,
                ty,
                cap,
            } => {
                commands::channel::add(config, &graph, &name, &from, &to, &ty, cap).await?;
            }
            ChannelCommands::Rm { graph, name } => {
                commands::channel::rm(config, &graph, &name).await?;
            }
        },
        Commands::Pin { command } => match command {
            PinCommands::Connect {
                graph,
                pin,
                channel,
            } => {
                commands::pin::connect(config, &graph, &pin, &channel).await?;
            }
            PinCommands::Disconnect { graph, pin } => {
                commands::pin::disconnect(config, &graph, &pin).await?;
            }
        },
        Commands::Apply { graph, input } => {
            commands::apply::run(config, &graph, &input).await?;
        }
        Commands::Generate { graph, out } => {
            commands::generate::generate(config, graph.as_deref(), out.as_deref()).await?;
        }
        Commands::Build { graph, out } => {
            commands::generate::build(config, &graph, out.as_deref()).await?;
        }
        Commands::Run { graph, out } => {
            commands::generate::run(config, &graph, out.as_deref()).await?;
        }
        Commands::Parts => {
            commands::parts::run().await?;
        }
    }

    Ok(())
}
