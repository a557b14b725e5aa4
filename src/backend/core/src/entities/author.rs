use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{Entity, FieldDescriptor, FieldType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub id: Uuid,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_active: bool,
    pub tenant_id: Option<Uuid>,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            biography: None,
            birth_date: None,
            is_active: true,
            tenant_id: None,
        }
    }
}

impl Author {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Entity for Author {
    const NAME: &'static str = "Authors";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::new("Id", FieldType::Uuid, |a: &Author| a.id.into()),
            FieldDescriptor::text("Name", |a: &Author| a.name.clone().into()),
            FieldDescriptor::text("Biography", |a: &Author| a.biography.clone().into()),
            FieldDescriptor::new("BirthDate", FieldType::Date, |a: &Author| a.birth_date.into()),
            FieldDescriptor::new("IsActive", FieldType::Boolean, |a: &Author| a.is_active.into()),
            FieldDescriptor::new("TenantId", FieldType::Uuid, |a: &Author| a.tenant_id.into()),
        ]
    }

    fn key(&self) -> Uuid {
        self.id
    }
}
