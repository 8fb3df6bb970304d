use crate::repository::{Entity, PgEntity};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Entity for User {
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "first_name", "last_name", "email", "created_at"];
    const DEFAULT_ORDER_BY: &'static str = "id";

    fn id(&self) -> &str {
        &self.id
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "first_name" => self.first_name.cmp(&other.first_name),
            "last_name" => self.last_name.cmp(&other.last_name),
            "email" => self.email.cmp(&other.email),
            "created_at" => self.created_at.cmp(&other.created_at),
            _ => self.id.cmp(&other.id),
        }
    }
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "id, first_name, last_name, email, department_id, created_at, updated_at";
}
