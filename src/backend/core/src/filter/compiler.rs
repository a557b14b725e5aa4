//! Criteria and search term to predicate compilation.

use metrics::counter;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::criteria::{FilterCriterion, FilterQuery};
use super::operator::ComparisonOp;
use super::predicate::{Predicate, PredicateVisitor, RecordEvaluator};
use super::FilterError;
use crate::schema::{Entity, EntitySchema, SchemaRegistry};

// ═══════════════════════════════════════════════════════════════════════════════
// Compiled Predicate
// ═══════════════════════════════════════════════════════════════════════════════

/// A predicate bound to the schema of entity `E`.
///
/// Compilation has already validated every field reference and operand, so
/// evaluation cannot fail.
pub struct CompiledPredicate<E> {
    predicate: Predicate,
    schema: Arc<EntitySchema<E>>,
}

impl<E> CompiledPredicate<E> {
    /// Whether `record` satisfies the predicate.
    pub fn matches(&self, record: &E) -> bool {
        if self.predicate.is_match_all() {
            return true;
        }
        self.predicate
            .accept(&mut RecordEvaluator::new(&self.schema, record))
    }

    /// Lazily filter an iterator of records.
    pub fn filter<'a, I>(&'a self, records: I) -> impl Iterator<Item = &'a E> + 'a
    where
        I: IntoIterator<Item = &'a E>,
        I::IntoIter: 'a,
    {
        records.into_iter().filter(move |record| self.matches(record))
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }

    pub fn entity_name(&self) -> &'static str {
        self.schema.entity_name()
    }

    /// Render the predicate with an arbitrary visitor, e.g. a storage dialect.
    pub fn accept<V: PredicateVisitor>(&self, visitor: &mut V) -> V::Output {
        self.predicate.accept(visitor)
    }
}

impl<E> Clone for CompiledPredicate<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<E> fmt::Debug for CompiledPredicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("entity", &self.schema.entity_name())
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl<E> fmt::Display for CompiledPredicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.predicate, f)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compiler
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds [`CompiledPredicate`]s from request criteria.
///
/// Criteria are folded left to right. A criterion whose raw property name
/// equals that of the criterion immediately before it is OR-ed onto the
/// running predicate; any other criterion is AND-ed. Two criteria on the same
/// property separated by a different property are therefore AND-ed.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler<'r> {
    registry: &'r SchemaRegistry,
}

impl PredicateCompiler<'static> {
    /// Compiler backed by the process-wide schema registry.
    pub fn global() -> Self {
        Self::new(SchemaRegistry::global())
    }
}

impl Default for PredicateCompiler<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'r> PredicateCompiler<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Compile `criteria` and `search_term` for entity `E`.
    pub fn compile<E: Entity>(
        &self,
        criteria: &[FilterCriterion],
        search_term: &str,
    ) -> Result<CompiledPredicate<E>, FilterError> {
        let schema = self.registry.describe::<E>();

        let search = search_predicate(&schema, search_term);
        let folded = fold_criteria(&schema, criteria)?;

        let predicate = match (search, folded) {
            (Some(search), Some(folded)) => search.and(folded),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => Predicate::MatchAll,
        };

        counter!("tessera_predicates_compiled_total", "entity" => E::NAME).increment(1);
        debug!(
            entity = E::NAME,
            criteria = criteria.len(),
            search = !search_term.is_empty(),
            predicate = %predicate,
            "Compiled predicate"
        );

        Ok(CompiledPredicate { predicate, schema })
    }

    pub fn compile_query<E: Entity>(
        &self,
        query: &FilterQuery,
    ) -> Result<CompiledPredicate<E>, FilterError> {
        self.compile::<E>(&query.filters, query.search_term())
    }
}

/// OR of substring tests over every text field. `None` when the term is empty
/// or the entity has no text fields.
fn search_predicate<E>(schema: &EntitySchema<E>, term: &str) -> Option<Predicate> {
    if term.is_empty() {
        return None;
    }
    schema
        .text_fields()
        .map(|field| Predicate::contains(field.name(), term))
        .reduce(Predicate::or)
}

fn fold_criteria<E>(
    schema: &EntitySchema<E>,
    criteria: &[FilterCriterion],
) -> Result<Option<Predicate>, FilterError> {
    let mut running: Option<Predicate> = None;
    let mut previous: Option<&str> = None;

    for criterion in criteria {
        let comparison = compile_criterion(schema, criterion)?;

        running = Some(match running {
            None => comparison,
            Some(acc) if previous == Some(criterion.property_name.as_str()) => acc.or(comparison),
            Some(acc) => acc.and(comparison),
        });
        previous = Some(criterion.property_name.as_str());
    }

    Ok(running)
}

fn compile_criterion<E>(
    schema: &EntitySchema<E>,
    criterion: &FilterCriterion,
) -> Result<Predicate, FilterError> {
    let field = schema
        .field(&criterion.property_name)
        .ok_or_else(|| FilterError::UnknownProperty {
            entity: schema.entity_name().to_string(),
            property: criterion.property_name.clone(),
        })?;

    let value = field
        .field_type()
        .parse_value(&criterion.value)
        .map_err(|e| FilterError::TypeConversion {
            property: field.name().to_string(),
            expected: e.expected,
            value: e.value,
        })?;

    let op: ComparisonOp = criterion.operator.parse()?;

    Ok(Predicate::compare(field.name(), op, value))
}
