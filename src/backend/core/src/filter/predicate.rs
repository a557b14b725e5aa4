//! Predicate AST and the visitor used to evaluate or render it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::operator::ComparisonOp;
use crate::schema::{EntitySchema, FieldValue};

// ═══════════════════════════════════════════════════════════════════════════════
// AST
// ═══════════════════════════════════════════════════════════════════════════════

/// A boolean expression over the fields of one entity type.
///
/// Field references use the canonical descriptor name, never the raw name a
/// caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    MatchAll,
    Compare {
        field: String,
        op: ComparisonOp,
        value: FieldValue,
    },
    Contains {
        field: String,
        term: String,
    },
    And {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Or {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: impl Into<FieldValue>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            term: term.into(),
        }
    }

    pub fn and(self, right: Predicate) -> Self {
        Self::And {
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn or(self, right: Predicate) -> Self {
        Self::Or {
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll)
    }

    /// Number of leaf comparisons.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::MatchAll => 0,
            Self::Compare { .. } | Self::Contains { .. } => 1,
            Self::And { left, right } | Self::Or { left, right } => {
                left.leaf_count() + right.leaf_count()
            }
        }
    }

    /// Walk the tree bottom-up.
    pub fn accept<V: PredicateVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::MatchAll => visitor.match_all(),
            Self::Compare { field, op, value } => visitor.compare(field, *op, value),
            Self::Contains { field, term } => visitor.contains(field, term),
            Self::And { left, right } => {
                let l = left.accept(visitor);
                let r = right.accept(visitor);
                visitor.and(l, r)
            }
            Self::Or { left, right } => {
                let l = left.accept(visitor);
                let r = right.accept(visitor);
                visitor.or(l, r)
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => f.write_str("TRUE"),
            Self::Compare { field, op, value } => write!(f, "{} {} {}", field, op, value),
            Self::Contains { field, term } => write!(f, "{} CONTAINS '{}'", field, term),
            Self::And { left, right } => write!(f, "({} AND {})", left, right),
            Self::Or { left, right } => write!(f, "({} OR {})", left, right),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Visitor
// ═══════════════════════════════════════════════════════════════════════════════

/// Translates a [`Predicate`] into some target form, one node at a time.
///
/// Children are visited before their parent, left before right.
pub trait PredicateVisitor {
    type Output;

    fn match_all(&mut self) -> Self::Output;
    fn compare(&mut self, field: &str, op: ComparisonOp, value: &FieldValue) -> Self::Output;
    fn contains(&mut self, field: &str, term: &str) -> Self::Output;
    fn and(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;
    fn or(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;
}

/// Evaluates a predicate against a single record.
///
/// A `Null` field satisfies only `notEquals`. `Contains` is a case-sensitive
/// substring test and is false for anything that is not text.
pub struct RecordEvaluator<'a, E> {
    schema: &'a EntitySchema<E>,
    record: &'a E,
}

impl<'a, E> RecordEvaluator<'a, E> {
    pub fn new(schema: &'a EntitySchema<E>, record: &'a E) -> Self {
        Self { schema, record }
    }

    fn read(&self, field: &str) -> Option<FieldValue> {
        self.schema.field(field).map(|d| d.read(self.record))
    }
}

impl<E> PredicateVisitor for RecordEvaluator<'_, E> {
    type Output = bool;

    fn match_all(&mut self) -> bool {
        true
    }

    fn compare(&mut self, field: &str, op: ComparisonOp, value: &FieldValue) -> bool {
        match self.read(field) {
            Some(actual) => op.accepts(actual.compare(value)),
            None => false,
        }
    }

    fn contains(&mut self, field: &str, term: &str) -> bool {
        self.read(field)
            .as_ref()
            .and_then(FieldValue::as_text)
            .is_some_and(|text| text.contains(term))
    }

    fn and(&mut self, left: bool, right: bool) -> bool {
        left && right
    }

    fn or(&mut self, left: bool, right: bool) -> bool {
        left || right
    }
}
