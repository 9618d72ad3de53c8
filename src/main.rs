use anyhow::Result;
use clap::{Parser, Subcommand};
use egograph::notify::TelegramNotifier;
use egograph::server::EgographServer;
use egograph::{BuildOutcome, BuildParameters, Config, GoogleSuggestClient, GraphBuilder, SuggestionSource};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "egograph")]
#[command(about = "Build weighted term-relationship graphs from search suggestions")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override server.port from config.toml
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Build one graph and print the result object as JSON
    Build {
        /// Seed term
        query: String,
        /// Number of BFS levels
        #[arg(short, long)]
        depth: Option<u32>,
        /// Cumulative distance budget
        #[arg(short, long)]
        radius: Option<u32>,
        /// Output format
        #[arg(short, long)]
        format: Option<String>,
        /// Join pattern
        #[arg(short, long)]
        pattern: Option<String>,
    },
}

fn build_source(config: &Config) -> Result<Arc<dyn SuggestionSource>> {
    Ok(Arc::new(GoogleSuggestClient::from_config(&config.suggest)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => run_server(config, port).await?,
        Command::Build { query, depth, radius, format, pattern } => {
            let defaults = &config.build;
            let params = BuildParameters::new(query)
                .with_depth(depth.unwrap_or(defaults.depth))
                .with_radius(radius.unwrap_or(defaults.radius))
                .with_format(format.unwrap_or_else(|| defaults.format.clone()))
                .with_pattern(pattern.unwrap_or_else(|| defaults.pattern.clone()));
            run_build(&config, params).await?;
        }
    }

    Ok(())
}

/// Run the HTTP server
async fn run_server(mut config: Config, port: Option<u16>) -> Result<()> {
    log::info!("Starting Egograph v{}", env!("CARGO_PKG_VERSION"));

    if let Some(port) = port {
        config.server.port = port;
    }

    let source = build_source(&config)?;
    let notifier = TelegramNotifier::from_env(&config.notify.credentials_env)?;

    let server = EgographServer::new(config, source, notifier);
    server.run().await?;

    Ok(())
}

/// Build a single graph and write the result object to stdout
async fn run_build(config: &Config, params: BuildParameters) -> Result<()> {
    let source = build_source(config)?;
    let mut builder = GraphBuilder::new(params, source).with_timeout(config.build_timeout());

    if builder.build().await? == BuildOutcome::TimedOut {
        log::warn!("Build timed out, printing partial graph");
    }

    let result = builder.to_result()?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
