//! Request-supplied filter criteria.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `property operator value` triple. Order within a list is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriterion {
    #[serde(alias = "PropertyName")]
    pub property_name: String,
    #[serde(alias = "Operator")]
    pub operator: String,
    #[serde(alias = "Value", default)]
    pub value: String,
}

impl FilterCriterion {
    pub fn new(
        property_name: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Parse the CLI shorthand `Property:operator:value`.
    ///
    /// The value is everything after the second colon, so it may itself
    /// contain colons (timestamps).
    pub fn parse_shorthand(input: &str) -> Option<Self> {
        let mut parts = input.splitn(3, ':');
        let property = parts.next().filter(|p| !p.is_empty())?;
        let operator = parts.next().filter(|o| !o.is_empty())?;
        let value = parts.next()?;
        Some(Self::new(property, operator, value))
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.property_name, self.operator, self.value)
    }
}

/// Body of a query request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    #[serde(default, alias = "Filters")]
    pub filters: Vec<FilterCriterion>,
    #[serde(default, alias = "SearchTerm", skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl FilterQuery {
    pub fn new(filters: Vec<FilterCriterion>) -> Self {
        Self {
            filters,
            search_term: None,
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn search_term(&self) -> &str {
        self.search_term.as_deref().unwrap_or_default()
    }
}
