//! Offline filter compilation.
//!
//! Compiles `Property:operator:value` criteria against a built-in entity and
//! prints the predicate tree alongside the SQL it renders to.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tessera_core::entities::{Author, Book};
use tessera_core::filter::{FilterCriterion, Predicate, PredicateCompiler, SqlRenderer};
use tessera_core::schema::{Entity, FieldValue};

use super::{parse_filters, BuiltinEntity};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CompileArgs {
    /// Entity name, e.g. Books
    entity: String,

    /// Filter criterion as Property:operator:value (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Free-text search term
    #[arg(short, long, default_value = "")]
    search: String,
}

#[derive(Debug, Serialize)]
struct CompileReport {
    entity: &'static str,
    expression: String,
    predicate: Predicate,
    sql: String,
    params: Vec<FieldValue>,
}

pub fn execute(args: CompileArgs, format: OutputFormat) -> Result<()> {
    let criteria = parse_filters(&args.filters)?;
    let report = match BuiltinEntity::resolve(&args.entity)? {
        BuiltinEntity::Books => compile_for::<Book>(&criteria, &args.search)?,
        BuiltinEntity::Authors => compile_for::<Author>(&criteria, &args.search)?,
    };

    match format {
        OutputFormat::Table => {
            output::print_header(&format!("{} predicate", report.entity));
            output::print_detail("Expression", &report.expression);
            output::print_detail("WHERE", &report.sql);
            for (i, param) in report.params.iter().enumerate() {
                output::print_detail(&format!("${}", i + 1), &param.to_string());
            }
            Ok(())
        }
        _ => output::print_item(&report, format),
    }
}

fn compile_for<E: Entity>(criteria: &[FilterCriterion], search: &str) -> Result<CompileReport> {
    let compiled = PredicateCompiler::global().compile::<E>(criteria, search)?;
    let clause = SqlRenderer::render(compiled.predicate());

    Ok(CompileReport {
        entity: E::NAME,
        expression: compiled.to_string(),
        predicate: compiled.into_predicate(),
        sql: clause.sql,
        params: clause.params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_for_books() {
        let criteria = parse_filters(&["Genre:=:Drama".to_string(), "Price:>:10".to_string()]).unwrap();
        let report = compile_for::<Book>(&criteria, "").unwrap();

        assert_eq!(report.entity, "Books");
        assert_eq!(report.params.len(), 2);
        assert!(report.sql.contains("\"Genre\""));
    }

    #[test]
    fn test_compile_for_rejects_unknown_property() {
        let criteria = parse_filters(&["Nope:=:x".to_string()]).unwrap();
        assert!(compile_for::<Author>(&criteria, "").is_err());
    }
}
