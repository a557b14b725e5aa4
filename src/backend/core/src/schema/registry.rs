//! Lazily built, process-wide cache of entity field descriptors.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::field::{FieldDescriptor, FieldType};

/// Global registry instance.
static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

// ═══════════════════════════════════════════════════════════════════════════════
// Entity
// ═══════════════════════════════════════════════════════════════════════════════

/// A record type whose fields can be filtered and searched.
///
/// Implementors list their fields once; the registry caches the result.
pub trait Entity: Send + Sync + 'static {
    /// Entity name as used in routes and ACL entries.
    const NAME: &'static str;

    /// Ordered field descriptors.
    fn fields() -> Vec<FieldDescriptor<Self>>
    where
        Self: Sized;

    /// Record identity used by stores.
    fn key(&self) -> uuid::Uuid;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entity Schema
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable field metadata for one entity type.
#[derive(Debug)]
pub struct EntitySchema<E> {
    entity_name: &'static str,
    fields: Vec<FieldDescriptor<E>>,
}

impl<E: Entity> EntitySchema<E> {
    fn build() -> Self {
        Self {
            entity_name: E::NAME,
            fields: E::fields(),
        }
    }
}

impl<E> EntitySchema<E> {
    pub fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    pub fn fields(&self) -> &[FieldDescriptor<E>] {
        &self.fields
    }

    /// Resolve a property name: exact match first, then case-insensitive.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<E>> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .or_else(|| self.fields.iter().find(|f| f.name().eq_ignore_ascii_case(name)))
    }

    pub fn text_fields(&self) -> impl Iterator<Item = &FieldDescriptor<E>> {
        self.fields.iter().filter(|f| f.is_text())
    }

    pub fn has_text_fields(&self) -> bool {
        self.fields.iter().any(|f| f.is_text())
    }

    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            entity_name: self.entity_name.to_string(),
            fields: self
                .fields
                .iter()
                .map(|f| FieldSummary {
                    name: f.name().to_string(),
                    field_type: f.field_type(),
                    searchable: f.is_text(),
                })
                .collect(),
        }
    }
}

/// Type-erased description of an entity, used for form/layout delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub entity_name: String,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub name: String,
    pub field_type: FieldType,
    pub searchable: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Caches one [`EntitySchema`] per entity type.
///
/// Each type owns a [`OnceLock`] cell. The map's shard lock is held only to
/// fetch or insert that cell; the schema itself is built afterwards, so a
/// field builder may describe other entities. Concurrent first access still
/// builds exactly once and every caller observes the same `Arc`.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: DashMap<TypeId, Arc<SchemaCell>>,
    summaries: DashMap<String, SchemaSummary>,
}

type SchemaCell = OnceLock<Arc<dyn Any + Send + Sync>>;

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        REGISTRY.get_or_init(SchemaRegistry::new)
    }

    /// Field descriptors for `E`, built on first access.
    pub fn describe<E: Entity>(&self) -> Arc<EntitySchema<E>> {
        let type_id = TypeId::of::<E>();
        let existing = self.schemas.get(&type_id).map(|c| Arc::clone(c.value()));
        let cell = match existing {
            Some(cell) => cell,
            None => Arc::clone(self.schemas.entry(type_id).or_default().value()),
        };

        let cached = cell.get_or_init(|| {
            let schema = EntitySchema::<E>::build();
            debug!(
                entity = E::NAME,
                fields = schema.fields.len(),
                text_fields = schema.text_fields().count(),
                "Built entity schema"
            );
            self.summaries
                .insert(E::NAME.to_lowercase(), schema.summary());
            Arc::new(schema) as Arc<dyn Any + Send + Sync>
        });

        Arc::clone(cached)
            .downcast::<EntitySchema<E>>()
            .expect("schema cells are keyed by the TypeId of the schema they hold")
    }

    /// Summary of a previously described entity, looked up case-insensitively.
    pub fn summary(&self, entity_name: &str) -> Option<SchemaSummary> {
        self.summaries
            .get(&entity_name.to_lowercase())
            .map(|s| s.value().clone())
    }

    /// Names of all described entities, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .summaries
            .iter()
            .map(|s| s.value().entity_name.clone())
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("entities", &self.entity_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    /// Only described by the concurrency test, so the build counter is exact.
    struct Contended;

    impl Entity for Contended {
        const NAME: &'static str = "Contended";

        fn fields() -> Vec<FieldDescriptor<Self>> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            vec![FieldDescriptor::text("Name", |_: &Contended| FieldValue::Null)]
        }

        fn key(&self) -> Uuid {
            Uuid::nil()
        }
    }

    struct Counted {
        id: Uuid,
        label: String,
    }

    impl Entity for Counted {
        const NAME: &'static str = "Counted";

        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("Id", FieldType::Uuid, |c: &Counted| c.id.into()),
                FieldDescriptor::text("Label", |c: &Counted| c.label.as_str().into()),
            ]
        }

        fn key(&self) -> Uuid {
            self.id
        }
    }

    /// Describes `Counted` while its own schema is being built.
    struct Nested;

    impl Entity for Nested {
        const NAME: &'static str = "Nested";

        fn fields() -> Vec<FieldDescriptor<Self>> {
            let inner = SchemaRegistry::global().describe::<Counted>();
            assert_eq!(inner.fields().len(), 2);
            vec![FieldDescriptor::text("Note", |_: &Nested| FieldValue::Null)]
        }

        fn key(&self) -> Uuid {
            Uuid::nil()
        }
    }

    struct Bare;

    impl Entity for Bare {
        const NAME: &'static str = "Bare";

        fn fields() -> Vec<FieldDescriptor<Self>> {
            Vec::new()
        }

        fn key(&self) -> Uuid {
            Uuid::nil()
        }
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let registry = Arc::new(SchemaRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.describe::<Contended>())
            })
            .collect();

        let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert!(schemas.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(schemas[0].fields().len(), 1);
    }

    #[test]
    fn test_field_resolution_falls_back_to_case_insensitive() {
        let registry = SchemaRegistry::new();
        let schema = registry.describe::<Counted>();

        assert_eq!(schema.field("Label").map(|f| f.name()), Some("Label"));
        assert_eq!(schema.field("label").map(|f| f.name()), Some("Label"));
        assert!(schema.field("Missing").is_none());

        let record = Counted {
            id: Uuid::nil(),
            label: "hello".into(),
        };
        let label = schema.field("Label").unwrap();
        assert_eq!(label.read(&record), FieldValue::Text("hello".into()));
    }

    #[test]
    fn test_field_builder_may_describe_another_entity() {
        let handle = std::thread::spawn(|| SchemaRegistry::global().describe::<Nested>());
        let schema = handle.join().unwrap();

        assert_eq!(schema.fields().len(), 1);
        assert!(SchemaRegistry::global().summary("counted").is_some());
        assert!(SchemaRegistry::global().summary("nested").is_some());
    }

    #[test]
    fn test_zero_field_entity_is_not_an_error() {
        let registry = SchemaRegistry::new();
        let schema = registry.describe::<Bare>();
        assert!(schema.fields().is_empty());
        assert!(!schema.has_text_fields());
    }

    #[test]
    fn test_summary_lookup_is_case_insensitive() {
        let registry = SchemaRegistry::new();
        assert!(registry.summary("counted").is_none());

        registry.describe::<Counted>();
        let summary = registry.summary("COUNTED").unwrap();
        assert_eq!(summary.entity_name, "Counted");
        assert_eq!(summary.fields.len(), 2);
        assert!(summary.fields[1].searchable);
        assert_eq!(registry.entity_names(), vec!["Counted".to_string()]);
    }
}
