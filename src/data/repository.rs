use crate::{
    data::{
        EntityStore,
        entity::{Entity, EntityKind, SearchHit},
        validation::{EntityFields, validate_new, validate_update},
    },
    error::{InvalidIdentifierSnafu, NotFoundSnafu, RosterResult},
};
use snafu::{OptionExt, ResultExt};
use time::OffsetDateTime;
use uuid::Uuid;

pub const SEARCH_LIMIT: i64 = 50;

#[derive(Clone, Copy)]
pub struct Repository<'a> {
    kind: EntityKind,
    store: &'a dyn EntityStore,
}

fn parse_id(id: &str) -> RosterResult<Uuid> {
    Uuid::try_parse(id).context(InvalidIdentifierSnafu { original: id })
}

impl<'a> Repository<'a> {
    pub const fn new(kind: EntityKind, store: &'a dyn EntityStore) -> Self {
        Self { kind, store }
    }

    pub async fn list_all(&self) -> RosterResult<Vec<Entity>> {
        self.store.list(self.kind).await
    }

    pub async fn get_by_id(&self, id: &str) -> RosterResult<Entity> {
        let id = parse_id(id)?;
        self.store
            .find(self.kind, id)
            .await?
            .context(NotFoundSnafu {
                kind: self.kind,
                id,
            })
    }

    pub async fn create(&self, fields: EntityFields) -> RosterResult<Entity> {
        let record = validate_new(fields)?;
        let entity = self
            .store
            .insert(self.kind, Uuid::new_v4(), OffsetDateTime::now_utc(), &record)
            .await?;

        info!(kind = %self.kind, id = %entity.id, "Created record");
        Ok(entity)
    }

    pub async fn update(&self, id: &str, fields: EntityFields) -> RosterResult<Entity> {
        let existing = self.get_by_id(id).await?;
        let record = validate_update(&existing, fields)?;

        let entity = self
            .store
            .update(self.kind, existing.id, OffsetDateTime::now_utc(), &record)
            .await?
            .context(NotFoundSnafu {
                kind: self.kind,
                id: existing.id,
            })?;

        info!(kind = %self.kind, id = %entity.id, "Updated record");
        Ok(entity)
    }

    pub async fn delete_by_id(&self, id: &str) -> RosterResult<Entity> {
        let id = parse_id(id)?;
        let entity = self
            .store
            .remove(self.kind, id)
            .await?
            .context(NotFoundSnafu {
                kind: self.kind,
                id,
            })?;

        info!(kind = %self.kind, %id, "Deleted record");
        Ok(entity)
    }

    /// Blank queries never reach storage; anything else is matched as given.
    pub async fn search(&self, query: &str) -> RosterResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.store.search(self.kind, query, SEARCH_LIMIT).await
    }
}
