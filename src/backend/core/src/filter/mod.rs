//! Predicate compilation over arbitrary entity types.
//!
//! A request supplies an ordered list of [`FilterCriterion`] values plus an
//! optional free-text search term. [`PredicateCompiler`] resolves each
//! criterion against the entity's schema, converts its raw value to the
//! declared field type and folds everything into a single [`Predicate`] AST.
//! The AST is evaluated in memory by [`CompiledPredicate`] or rendered into a
//! storage-native form through a [`PredicateVisitor`] such as [`SqlRenderer`].

pub mod compiler;
pub mod criteria;
pub mod operator;
pub mod predicate;
pub mod sql;

pub use compiler::{CompiledPredicate, PredicateCompiler};
pub use criteria::{FilterCriterion, FilterQuery};
pub use operator::ComparisonOp;
pub use predicate::{Predicate, PredicateVisitor, RecordEvaluator};
pub use sql::{SqlRenderer, SqlWhereClause};

use thiserror::Error;

use crate::schema::FieldType;

/// Terminal errors raised while compiling criteria. Any of these aborts the
/// request; no criterion is ever silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Property '{property}' does not exist on entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    #[error("Value '{value}' for property '{property}' is not a valid {expected}")]
    TypeConversion {
        property: String,
        expected: FieldType,
        value: String,
    },

    #[error("Operator '{0}' is not supported")]
    UnsupportedOperator(String),
}
