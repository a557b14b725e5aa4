//! Entity field catalogue.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tessera_core::entities::{Author, Book};
use tessera_core::schema::{SchemaRegistry, SchemaSummary};

use super::BuiltinEntity;
use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct SchemaArgs {
    /// Entity name, e.g. Books
    entity: String,

    /// Fetch from the server instead of the built-in catalogue
    #[arg(long)]
    remote: bool,

    /// Bearer credential, required with --remote
    #[arg(short, long, env = "TESSERA_TOKEN")]
    token: Option<String>,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Searchable")]
    searchable: bool,
}

pub async fn execute(args: SchemaArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let summary = if args.remote {
        let token = args
            .token
            .as_deref()
            .context("--remote requires --token or TESSERA_TOKEN")?;
        client
            .get::<SchemaSummary>(&format!("/api/schema/{}", args.entity), Some(token))
            .await?
    } else {
        local_summary(BuiltinEntity::resolve(&args.entity)?)
    };

    match format {
        OutputFormat::Table => {
            output::print_header(&summary.entity_name);
            let rows: Vec<FieldRow> = summary
                .fields
                .into_iter()
                .map(|f| FieldRow {
                    name: f.name,
                    field_type: f.field_type.to_string(),
                    searchable: f.searchable,
                })
                .collect();
            output::print_list(&rows, format)
        }
        _ => output::print_item(&summary, format),
    }
}

fn local_summary(entity: BuiltinEntity) -> SchemaSummary {
    let registry = SchemaRegistry::global();
    match entity {
        BuiltinEntity::Books => registry.describe::<Book>().summary(),
        BuiltinEntity::Authors => registry.describe::<Author>().summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_summary_marks_text_fields() {
        let summary = local_summary(BuiltinEntity::Authors);
        assert_eq!(summary.entity_name, "Authors");
        let name = summary.fields.iter().find(|f| f.name == "Name").unwrap();
        assert!(name.searchable);
    }
}
