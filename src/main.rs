use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

mod config;
mod error;
mod function;
mod handler;
mod http;
mod invoke;
mod logger;
mod server;

#[derive(Parser)]
#[command(
    name = "fnhost",
    about = "Serve Netlify-style functions locally",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP host (default)
    Serve,
    /// Run one function against an event JSON and print the response
    Invoke {
        /// Registered function name
        name: String,
        /// Event file in Netlify/Lambda format, `-` for stdin
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// List registered functions
    Functions,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config).map_err(error::HostError::from)?;
    logger::init(&cfg)?;

    let registry = function::FunctionRegistry::with_builtins();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cfg, registry),
        Commands::Invoke { name, event } => {
            let invocation = invoke::read_event(event.as_deref())?;
            let response = invoke::invoke(&registry, &name, &invocation)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Functions => {
            let base_path = cfg.functions.normalized_base_path();
            for name in registry.names() {
                println!("{name}\t{base_path}/{name}");
            }
            Ok(())
        }
    }
}

fn serve(
    cfg: config::Config,
    registry: function::FunctionRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    // Tokio runtime sized by server.workers, CPU count otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let state = Arc::new(config::AppState::new(&cfg, registry));
    runtime.block_on(server::serve(state))?;
    Ok(())
}
