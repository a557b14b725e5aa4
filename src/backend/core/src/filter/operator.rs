//! Comparison operators.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 6] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEqual => "greaterThanOrEqual",
            Self::LessThan => "lessThan",
            Self::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Whether an ordering between a field value and the operand satisfies
    /// this operator. `None` (incomparable) only satisfies `NotEquals`.
    pub fn accepts(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::NotEquals, None) => true,
            (_, None) => false,
            (Self::Equals, Some(o)) => o == Ordering::Equal,
            (Self::NotEquals, Some(o)) => o != Ordering::Equal,
            (Self::GreaterThan, Some(o)) => o == Ordering::Greater,
            (Self::GreaterThanOrEqual, Some(o)) => o != Ordering::Less,
            (Self::LessThan, Some(o)) => o == Ordering::Less,
            (Self::LessThanOrEqual, Some(o)) => o != Ordering::Greater,
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = s.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.symbol() == op || candidate.name().eq_ignore_ascii_case(op))
            .ok_or_else(|| FilterError::UnsupportedOperator(s.to_string()))
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
