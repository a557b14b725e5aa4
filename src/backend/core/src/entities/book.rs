use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{Entity, FieldDescriptor, FieldType};

/// A book in a tenant's catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub id: Uuid,
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
    pub genre: Option<String>,
    pub publication: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub price: Option<i32>,
    pub quantity: Option<i32>,
    pub tenant_id: Option<Uuid>,
    pub created_on: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_on: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

impl Default for Book {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: None,
            author_id: None,
            genre: None,
            publication: None,
            publish_date: None,
            price: Some(100),
            quantity: Some(1),
            tenant_id: None,
            created_on: None,
            created_by: None,
            updated_on: None,
            updated_by: None,
        }
    }
}

impl Book {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl Entity for Book {
    const NAME: &'static str = "Books";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::new("Id", FieldType::Uuid, |b: &Book| b.id.into()),
            FieldDescriptor::text("Title", |b: &Book| b.title.clone().into()),
            FieldDescriptor::new("AuthorId", FieldType::Uuid, |b: &Book| b.author_id.into()),
            FieldDescriptor::text("Genre", |b: &Book| b.genre.clone().into()),
            FieldDescriptor::text("Publication", |b: &Book| b.publication.clone().into()),
            FieldDescriptor::new("PublishDate", FieldType::DateTime, |b: &Book| b.publish_date.into()),
            FieldDescriptor::new("Price", FieldType::Integer, |b: &Book| b.price.into()),
            FieldDescriptor::new("Quantity", FieldType::Integer, |b: &Book| b.quantity.into()),
            FieldDescriptor::new("TenantId", FieldType::Uuid, |b: &Book| b.tenant_id.into()),
            FieldDescriptor::new("CreatedOn", FieldType::DateTime, |b: &Book| b.created_on.into()),
            FieldDescriptor::new("CreatedBy", FieldType::Uuid, |b: &Book| b.created_by.into()),
            FieldDescriptor::new("UpdatedOn", FieldType::DateTime, |b: &Book| b.updated_on.into()),
            FieldDescriptor::new("UpdatedBy", FieldType::Uuid, |b: &Book| b.updated_by.into()),
        ]
    }

    fn key(&self) -> Uuid {
        self.id
    }
}
