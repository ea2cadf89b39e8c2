use crate::{
    data::{
        EntityStore,
        connection::{ConnectionManager, Connector},
        entity::{Entity, EntityKind, SearchHit},
        validation::ValidRecord,
    },
    error::{DuplicateKeySnafu, RosterResult},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use time::OffsetDateTime;
use uuid::Uuid;

type Tables = Arc<Mutex<HashMap<EntityKind, Vec<Entity>>>>;

#[derive(Default)]
pub struct MemoryConnector {
    tables: Tables,
    pub attempts: AtomicUsize,
    pub failures_left: AtomicUsize,
}

#[async_trait]
impl Connector for MemoryConnector {
    type Handle = Tables;

    async fn connect(&self) -> Result<Tables, sqlx::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(Arc::clone(&self.tables))
    }

    async fn close(&self, _handle: Tables) {}
}

pub struct MemoryStore {
    connections: ConnectionManager<MemoryConnector>,
    pub accesses: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            connections: ConnectionManager::new(MemoryConnector::default()),
            accesses: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    pub fn failing_connections(failures: usize) -> Self {
        let store = Self::default();
        store
            .connector()
            .failures_left
            .store(failures, Ordering::SeqCst);
        store
    }

    pub fn connector(&self) -> &MemoryConnector {
        self.connections.connector()
    }

    async fn tables(&self) -> RosterResult<Tables> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.connections.get_connection().await
    }
}

fn email_taken(rows: &[Entity], email: &str, except: Option<Uuid>) -> bool {
    rows.iter()
        .any(|row| row.email == email && Some(row.id) != except)
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn warm_up(&self) -> RosterResult<()> {
        self.tables().await.map(drop)
    }

    async fn list(&self, kind: EntityKind) -> RosterResult<Vec<Entity>> {
        let tables = self.tables().await?;
        let tables = tables.lock().unwrap();
        let mut rows = tables.get(&kind).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>> {
        let tables = self.tables().await?;
        let tables = tables.lock().unwrap();
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|row| row.id == id))
            .cloned())
    }

    async fn insert(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Entity> {
        let tables = self.tables().await?;
        let mut tables = tables.lock().unwrap();
        let rows = tables.entry(kind).or_default();

        if email_taken(rows, &record.email, None) {
            return DuplicateKeySnafu {
                kind,
                field: "email",
            }
            .fail();
        }

        let entity = Entity {
            id,
            name: record.name.clone(),
            age: record.age,
            email: record.email.clone(),
            created_at: now,
            updated_at: now,
        };
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Option<Entity>> {
        let tables = self.tables().await?;
        let mut tables = tables.lock().unwrap();
        let rows = tables.entry(kind).or_default();

        if email_taken(rows, &record.email, Some(id)) {
            return DuplicateKeySnafu {
                kind,
                field: "email",
            }
            .fail();
        }

        Ok(rows.iter_mut().find(|row| row.id == id).map(|row| {
            row.name.clone_from(&record.name);
            row.age = record.age;
            row.email.clone_from(&record.email);
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn remove(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>> {
        let tables = self.tables().await?;
        let mut tables = tables.lock().unwrap();
        let rows = tables.entry(kind).or_default();

        Ok(rows
            .iter()
            .position(|row| row.id == id)
            .map(|index| rows.remove(index)))
    }

    async fn search(
        &self,
        kind: EntityKind,
        needle: &str,
        limit: i64,
    ) -> RosterResult<Vec<SearchHit>> {
        let tables = self.tables().await?;
        let tables = tables.lock().unwrap();
        let needle = needle.to_lowercase();

        let mut hits: Vec<Entity> = tables
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        row.name.to_lowercase().contains(&needle)
                            || row.email.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(hits
            .into_iter()
            .take(usize::try_from(limit).unwrap())
            .map(SearchHit::from)
            .collect())
    }

    async fn shutdown(&self) {
        self.connections.shutdown().await;
    }
}
