// SPDX-License-Identifier: MIT OR Apache-2.0
//! FlowNode command-line harness.
//!
//! Lists registered node types, runs graphs saved as RON, and builds a
//! small demo graph through the undoable command layer.

mod demo;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flownode_graph::{EngineConfig, GraphDocument, GraphEngine, NodeRegistry, RunReport};
use flownode_history::CommandHistory;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Node graph runner
#[derive(Debug, Parser)]
#[command(name = "flownode", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every registered node path
    List,

    /// Run a graph saved as RON
    Run {
        /// Graph document to load
        graph: PathBuf,

        /// Engine configuration (RON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build and run the demo graph
    Demo {
        /// Iterations of the demo loop
        #[arg(long, default_value_t = 3)]
        loop_count: i64,

        /// Save the demo graph as RON after running it
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    tracing::info!("Starting FlowNode v{}", env!("CARGO_PKG_VERSION"));
    run(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flownode=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = NodeRegistry::with_builtins();

    match cli.command {
        Command::List => {
            for path in registry.paths() {
                let description = registry
                    .info(path)
                    .map(|info| info.description.as_str())
                    .unwrap_or_default();
                println!("{path:<32} {description}");
            }
            Ok(())
        }
        Command::Run { graph, config } => {
            let config = match config {
                Some(path) => EngineConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            let document = GraphDocument::load(&graph)
                .with_context(|| format!("failed to load graph {}", graph.display()))?;
            let mut engine = document
                .rebuild(&registry, &config)
                .context("failed to rebuild graph")?;
            tracing::info!(
                nodes = engine.node_count(),
                connectors = engine.connector_count(),
                "loaded {}",
                graph.display()
            );

            let report = engine.run().context("graph run failed")?;
            print_outcome(&engine, report);
            Ok(())
        }
        Command::Demo { loop_count, save } => {
            let mut engine = GraphEngine::new();
            let mut history = CommandHistory::from_config(engine.config());
            demo::build(&registry, &mut engine, &mut history, loop_count)?;
            tracing::debug!(undo = ?history.undo_description(), "demo graph built");

            let report = engine.run().context("demo run failed")?;
            print_outcome(&engine, report);

            if let Some(path) = save {
                GraphDocument::capture(&engine)
                    .save(&path)
                    .with_context(|| format!("failed to save {}", path.display()))?;
                tracing::info!("saved demo graph to {}", path.display());
            }
            Ok(())
        }
    }
}

fn print_outcome(engine: &GraphEngine, report: RunReport) {
    println!(
        "run finished: {} entry node(s), {} activation(s)",
        report.entry_nodes, report.activations
    );
    for (key, variable) in engine.variables().iter() {
        println!("  {key}: {} = {}", variable.data_type, variable.value);
    }
}
