use crate::repository::{Entity, PgEntity};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Entity for Department {
    const SORTABLE_FIELDS: &'static [&'static str] = &["id", "name", "created_at"];
    const DEFAULT_ORDER_BY: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "name" => self.name.cmp(&other.name),
            "created_at" => self.created_at.cmp(&other.created_at),
            _ => self.id.cmp(&other.id),
        }
    }
}

impl PgEntity for Department {
    const TABLE: &'static str = "departments";
    const COLUMNS: &'static str = "id, name, created_at, updated_at";
}
