//! CLI subcommands.

pub mod compile;
pub mod health;
pub mod query;
pub mod schema;
pub mod token;

use anyhow::{bail, Result};
use tessera_core::entities::{Author, Book};
use tessera_core::schema::Entity;

/// Entity types known to this CLI build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinEntity {
    Books,
    Authors,
}

impl BuiltinEntity {
    pub const ALL: [BuiltinEntity; 2] = [Self::Books, Self::Authors];

    pub fn name(self) -> &'static str {
        match self {
            Self::Books => Book::NAME,
            Self::Authors => Author::NAME,
        }
    }

    /// Resolve a user-supplied entity name, case-insensitively.
    pub fn resolve(name: &str) -> Result<Self> {
        match Self::ALL.into_iter().find(|e| e.name().eq_ignore_ascii_case(name)) {
            Some(entity) => Ok(entity),
            None => {
                let known: Vec<&str> = Self::ALL.iter().map(|e| e.name()).collect();
                bail!("Unknown entity '{}' (known: {})", name, known.join(", "))
            }
        }
    }

    pub fn route(self) -> String {
        format!("/api/{}", self.name().to_lowercase())
    }
}

/// Parse repeated `Prop:op:value` arguments.
pub fn parse_filters(
    filters: &[String],
) -> Result<Vec<tessera_core::filter::FilterCriterion>> {
    filters
        .iter()
        .map(|raw| {
            tessera_core::filter::FilterCriterion::parse_shorthand(raw).ok_or_else(|| {
                anyhow::anyhow!("Invalid filter '{}', expected Property:operator:value", raw)
            })
        })
        .collect()
}
