use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use pathwalk_rs::flow::{GraphLoader, WalkStatus};
use pathwalk_rs::remote::{HttpPersistence, MemoryPersistence, PersistenceAdapter, SessionId};
use pathwalk_rs::script::Script;
use pathwalk_rs::session::WorkflowSession;

use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a graph document and report its structure
    Validate {
        /// Path to the graph document (.json, .yaml, .yml)
        #[arg(short, long)]
        graph: String,
    },
    /// Replay a scripted walk and print the completion payload
    Walk {
        /// Path to the graph document
        #[arg(short, long)]
        graph: String,

        /// Path to the YAML step script
        #[arg(short, long)]
        script: String,

        /// Category/session identifier used for the remote endpoints
        #[arg(long, default_value = "local")]
        session: String,

        /// Post the payload to PATHWALK_BASE_URL instead of a dry run
        #[arg(long)]
        submit: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = GraphLoader::new();

    match args.command {
        Commands::Validate { graph } => {
            let graph = loader
                .load_file(&graph)
                .with_context(|| format!("Failed to load graph {}", graph))?;

            println!(
                "{:?} graph with {} nodes, initial node {:?}",
                graph.flavor(),
                graph.len(),
                graph.initial_node_id()
            );
            for node in graph.nodes() {
                let next = graph
                    .resolve_successor(node.id)?
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "end".to_string());
                println!("  {:>5}  {:<16} -> {}", node.id, node.kind().as_str(), next);
            }
        }
        Commands::Walk {
            graph,
            script,
            session,
            submit,
        } => {
            let graph = loader
                .load_file(&graph)
                .with_context(|| format!("Failed to load graph {}", graph))?;
            let script = Script::load(&script)
                .with_context(|| format!("Failed to load script {}", script))?;

            let adapter: Arc<dyn PersistenceAdapter> = if submit {
                Arc::new(HttpPersistence::from_env()?)
            } else {
                log::info!("Dry run: payload kept in memory");
                Arc::new(MemoryPersistence::new())
            };

            let mut session =
                WorkflowSession::start(SessionId::new(session), Arc::new(graph), adapter)?;
            script.run(&mut session).await?;

            let view = session.view();
            if view.status != WalkStatus::Completed {
                println!(
                    "Walk not complete: at node {:?} after {} steps ({} nodes ahead)",
                    view.state.current_node_id(),
                    view.progress.answered,
                    view.progress.remaining
                );
                return Ok(());
            }

            let payload = session.navigator().payload()?;
            println!("{}", payload.to_json_pretty()?);

            if submit {
                let ack = session.submit().await?;
                println!("Submitted: status {}", ack.status);
            }
        }
    }

    Ok(())
}
