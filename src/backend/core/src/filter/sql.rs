//! PostgreSQL-style rendering of predicates.

use serde::Serialize;

use super::operator::ComparisonOp;
use super::predicate::{Predicate, PredicateVisitor};
use crate::schema::FieldValue;

/// A parameterised `WHERE` clause body. `params[n]` binds placeholder `$n+1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlWhereClause {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

/// Renders a [`Predicate`] into SQL with positional placeholders.
///
/// `notEquals` renders as `IS DISTINCT FROM` so that NULL columns match, the
/// same as in-memory evaluation.
#[derive(Debug, Default)]
pub struct SqlRenderer {
    params: Vec<FieldValue>,
}

impl SqlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(predicate: &Predicate) -> SqlWhereClause {
        let mut renderer = Self::new();
        let sql = predicate.accept(&mut renderer);
        SqlWhereClause {
            sql,
            params: renderer.params,
        }
    }

    fn bind(&mut self, value: FieldValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl PredicateVisitor for SqlRenderer {
    type Output = String;

    fn match_all(&mut self) -> String {
        "TRUE".to_string()
    }

    fn compare(&mut self, field: &str, op: ComparisonOp, value: &FieldValue) -> String {
        let column = quote_ident(field);
        let placeholder = self.bind(value.clone());
        let operator = match op {
            ComparisonOp::NotEquals => "IS DISTINCT FROM",
            other => other.symbol(),
        };
        format!("{} {} {}", column, operator, placeholder)
    }

    fn contains(&mut self, field: &str, term: &str) -> String {
        let column = quote_ident(field);
        let placeholder = self.bind(FieldValue::Text(term.to_string()));
        format!("strpos({}, {}) > 0", column, placeholder)
    }

    fn and(&mut self, left: String, right: String) -> String {
        format!("({} AND {})", left, right)
    }

    fn or(&mut self, left: String, right: String) -> String {
        format!("({} OR {})", left, right)
    }
}
