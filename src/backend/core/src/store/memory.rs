//! In-memory [`RecordStore`].

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::filter::CompiledPredicate;
use crate::schema::Entity;

/// Records kept in insertion order behind a read-write lock.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    records: RwLock<Vec<E>>,
}

impl<E> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Entity + Clone> InMemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = E>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl<E: Entity + Clone> RecordStore<E> for InMemoryStore<E> {
    async fn find(&self, predicate: &CompiledPredicate<E>) -> StoreResult<Vec<E>> {
        let records = self.records.read();
        let found: Vec<E> = predicate.filter(records.iter()).cloned().collect();
        debug!(
            entity = E::NAME,
            scanned = records.len(),
            matched = found.len(),
            "In-memory find"
        );
        Ok(found)
    }

    async fn get(&self, key: Uuid) -> StoreResult<E> {
        self.records
            .read()
            .iter()
            .find(|r| r.key() == key)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: E::NAME,
                key,
            })
    }

    async fn insert(&self, record: E) -> StoreResult<E> {
        let mut records = self.records.write();
        let key = record.key();
        if records.iter().any(|r| r.key() == key) {
            return Err(StoreError::Duplicate {
                entity: E::NAME,
                key,
            });
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: E) -> StoreResult<E> {
        let mut records = self.records.write();
        let key = record.key();
        let slot = records
            .iter_mut()
            .find(|r| r.key() == key)
            .ok_or(StoreError::NotFound {
                entity: E::NAME,
                key,
            })?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, key: Uuid) -> StoreResult<()> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.key() != key);
        if records.len() == before {
            return Err(StoreError::NotFound {
                entity: E::NAME,
                key,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Book;
    use crate::filter::{FilterCriterion, PredicateCompiler};
    use crate::schema::SchemaRegistry;

    #[tokio::test]
    async fn test_find_applies_predicate() {
        let store = InMemoryStore::with_records([
            Book { genre: Some("Poetry".into()), ..Book::titled("Odes") },
            Book { genre: Some("Drama".into()), ..Book::titled("Hamlet") },
        ]);

        let registry = SchemaRegistry::new();
        let predicate = PredicateCompiler::new(&registry)
            .compile::<Book>(&[FilterCriterion::new("Genre", "equals", "Drama")], "")
            .unwrap();

        let found = store.find(&predicate).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title.as_deref(), Some("Hamlet"));
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let store = InMemoryStore::new();
        let book = store.insert(Book::titled("Draft")).await.unwrap();

        assert!(matches!(
            store.insert(book.clone()).await,
            Err(StoreError::Duplicate { .. })
        ));

        let renamed = Book { title: Some("Final".into()), ..book.clone() };
        store.update(renamed).await.unwrap();
        assert_eq!(store.get(book.id).await.unwrap().title.as_deref(), Some("Final"));

        store.delete(book.id).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.get(book.id).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(store.delete(book.id).await, Err(StoreError::NotFound { .. })));
    }
}
