use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Student,
    Instructor,
}

impl EntityKind {
    pub const ALL: [Self; 2] = [Self::Student, Self::Instructor];

    pub const fn noun(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
        }
    }

    pub const fn table(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Instructor => "instructors",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.noun())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchHit {
    pub name: String,
    pub age: i32,
    pub email: String,
}

impl From<Entity> for SearchHit {
    fn from(Entity { name, age, email, .. }: Entity) -> Self {
        Self { name, age, email }
    }
}
