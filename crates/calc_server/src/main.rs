use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use calc_server::config::CalcConfig;
use calc_server::web::{error_message, router, AppState};
use calc_server::{api_key, build_solver};

#[derive(Parser)]
#[command(name = "calc_server")]
#[command(about = "Resuelve derivadas, integrales y límites escritos en lenguaje natural", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web form and the JSON API
    Serve {
        /// Listen address (overrides the config file)
        #[arg(short, long, env = "CALC_BIND")]
        bind: Option<String>,
    },
    /// Solve one problem and print the answer
    Solve {
        /// Problem statement, e.g. "Calcula la derivada de x^2"
        problem: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CalcConfig::load();

    match cli.command {
        Command::Serve { bind } => {
            init_tracing("info");
            let key = api_key(&config)?;
            let solver = build_solver(&config, &key)?;
            let bind = bind.unwrap_or_else(|| config.bind.clone());

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("binding {}", bind))?;
            info!(%bind, model = %config.model, "listening");
            axum::serve(listener, router(AppState::new(solver)))
                .await
                .context("server error")?;
        }
        Command::Solve { problem, format } => {
            init_tracing("warn");
            let key = api_key(&config)?;
            let solver = build_solver(&config, &key)?;

            let solution = solver
                .solve_problem(&problem)
                .await
                .map_err(|e| anyhow!(error_message(&e)))?;
            match format {
                OutputFormat::Text => {
                    println!("{}", solution.output);
                    println!();
                    println!("{}", solution.explanation);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&solution)?);
                }
            }
        }
    }
    Ok(())
}
