use crate::{
    data::{
        entity::{Entity, EntityKind, SearchHit},
        validation::ValidRecord,
    },
    error::RosterResult,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod connection;
pub mod entity;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod validation;

/// Unique email clashes must come back as [`DuplicateKey`](crate::error::RosterError::DuplicateKey).
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn warm_up(&self) -> RosterResult<()>;

    async fn list(&self, kind: EntityKind) -> RosterResult<Vec<Entity>>;
    async fn find(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>>;
    async fn insert(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Entity>;
    /// Overwrites the mutable fields and `updated_at`; `None` if nothing has that id.
    async fn update(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Option<Entity>>;
    async fn remove(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>>;
    /// Case-insensitive substring match on name or email, ordered by name.
    async fn search(
        &self,
        kind: EntityKind,
        needle: &str,
        limit: i64,
    ) -> RosterResult<Vec<SearchHit>>;

    async fn shutdown(&self);
}
