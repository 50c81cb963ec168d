use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use reduxable::{
    bind, logging, CentralStore, Manifest, Node, OperationCatalog, StateStore, Subtree,
};

#[derive(Debug, Parser)]
#[command(name = "reduxable", version, about = "Run scoped state containers from a manifest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the tree, apply dispatches in order and print the final state
    Run {
        /// Manifest path (defaults to the user config directory)
        manifest: Option<PathBuf>,

        /// `scope:operation` or `scope:operation=<json payload>`
        #[arg(short, long = "dispatch", value_name = "REQUEST")]
        dispatches: Vec<String>,
    },
    /// Validate a manifest and list its containers
    Check {
        manifest: Option<PathBuf>,
    },
}

/// One `--dispatch` argument.
#[derive(Debug, PartialEq)]
struct Request {
    scope: String,
    operation: String,
    payload: Option<Value>,
}

fn parse_request(raw: &str) -> Result<Request> {
    let (target, payload) = match raw.split_once('=') {
        Some((target, json)) => {
            let payload = serde_json::from_str(json)
                .with_context(|| format!("invalid JSON payload in '{raw}'"))?;
            (target, Some(payload))
        }
        None => (raw, None),
    };

    let Some((scope, operation)) = target.rsplit_once(':') else {
        bail!("expected scope:operation, got '{raw}'");
    };
    if scope.is_empty() || operation.is_empty() {
        bail!("expected scope:operation, got '{raw}'");
    }

    Ok(Request {
        scope: scope.to_string(),
        operation: operation.to_string(),
        payload,
    })
}

fn load(path: Option<PathBuf>) -> Result<Manifest> {
    let path = path.unwrap_or_else(Manifest::default_path);
    let manifest = Manifest::load(&path, &OperationCatalog::standard())?;
    tracing::debug!(path = %path.display(), "manifest loaded");
    Ok(manifest)
}

fn run(manifest: Manifest, dispatches: &[String]) -> Result<Value> {
    let requests = dispatches
        .iter()
        .map(|raw| parse_request(raw))
        .collect::<Result<Vec<_>>>()?;

    let root = manifest.into_root();
    let store = bind(root.clone(), CentralStore::create);

    for request in requests {
        let Some(container) = root.lookup(&request.scope).and_then(Node::as_container) else {
            bail!("no container at scope '{}'", request.scope);
        };
        container
            .invoke(&request.operation, request.payload)
            .with_context(|| format!("dispatch to '{}' failed", request.scope))?;
    }

    Ok(store.get_state())
}

fn describe(subtree: &Subtree, lines: &mut Vec<String>) {
    for (_, node) in subtree.nodes() {
        match node {
            Node::Container(container) => {
                let mut line = format!(
                    "{}: {}",
                    container.scope(),
                    container.operation_names().join(", ")
                );
                if container.is_global() {
                    line.push_str(" (global)");
                }
                lines.push(line);
                if let Some(children) = container.children() {
                    describe(children, lines);
                }
            }
            Node::Subtree(nested) => describe(nested, lines),
            Node::Update(_) => {}
        }
    }
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            manifest,
            dispatches,
        } => {
            let state = run(load(manifest)?, &dispatches)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Check { manifest } => {
            let manifest = load(manifest)?;
            let mut lines = Vec::new();
            describe(manifest.root(), &mut lines);
            for line in lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}
