//! Tessera CLI - compile filters, mint credentials and query a Tessera server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{compile, health, query, schema, token};
use output::OutputFormat;

/// Tessera - multi-tenant CRUD core CLI
#[derive(Parser)]
#[command(
    name = "tessera",
    version,
    about = "Tessera - multi-tenant, schema-agnostic CRUD core",
    long_about = "Compile filter criteria offline, issue and inspect credentials, and query a running Tessera server.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(
        long,
        global = true,
        env = "TESSERA_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile filter criteria into a predicate and SQL (offline)
    Compile(compile::CompileArgs),

    /// Credential operations
    #[command(subcommand)]
    Token(token::TokenCommands),

    /// Query records on a running server
    Query(query::QueryArgs),

    /// Describe an entity's fields
    Schema(schema::SchemaArgs),

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let client = client::ApiClient::new(&cli.api_url)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Compile(args) => compile::execute(args, format),
        Commands::Token(cmd) => token::execute(cmd, format).await,
        Commands::Query(args) => query::execute(args, &client, format).await,
        Commands::Schema(args) => schema::execute(args, &client, format).await,
        Commands::Health => health::execute(&client, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
