//! Remote record queries.

use anyhow::Result;
use clap::Args;
use tessera_core::filter::FilterQuery;

use super::{parse_filters, BuiltinEntity};
use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct QueryArgs {
    /// Entity name, e.g. Books
    entity: String,

    /// Bearer credential
    #[arg(short, long, env = "TESSERA_TOKEN")]
    token: String,

    /// Filter criterion as Property:operator:value (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Free-text search term
    #[arg(short, long)]
    search: Option<String>,
}

pub async fn execute(args: QueryArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let entity = BuiltinEntity::resolve(&args.entity)?;
    let query = FilterQuery {
        filters: parse_filters(&args.filters)?,
        search_term: args.search,
    };

    let records: Vec<serde_json::Value> = client
        .post(&format!("{}/query", entity.route()), &query, Some(&args.token))
        .await?;

    output::print_records(&records, format)?;
    if matches!(format, OutputFormat::Table) {
        output::print_info(&format!("{} {} record(s)", records.len(), entity.name()));
    }
    Ok(())
}
