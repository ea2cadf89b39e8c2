use crate::{
    config::DbConfig,
    data::{
        EntityStore,
        connection::{ConnectionManager, Connector},
        entity::{Entity, EntityKind, SearchHit},
        validation::ValidRecord,
    },
    error::{RosterError, RosterResult},
};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

const ENTITY_COLUMNS: &str = "id, name, age, email, created_at, updated_at";

#[derive(Debug)]
pub struct PgConnector {
    config: Arc<DbConfig>,
}

impl PgConnector {
    pub const fn new(config: Arc<DbConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections())
            .connect(self.config.url().expose_secret())
            .await?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        Ok(pool)
    }

    async fn close(&self, handle: PgPool) {
        handle.close().await;
    }
}

pub struct PgStore {
    connections: ConnectionManager<PgConnector>,
}

impl PgStore {
    pub fn new(connector: PgConnector) -> Self {
        Self {
            connections: ConnectionManager::new(connector),
        }
    }
}

fn classify(kind: EntityKind, e: sqlx::Error) -> RosterError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RosterError::DuplicateKey {
            kind,
            field: "email",
        },
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed) => RosterError::ConnectionFailed {
            source: Arc::new(e),
        },
        source => RosterError::MakeQuery { source },
    }
}

/// Escapes `LIKE` metacharacters so the needle only ever matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl EntityStore for PgStore {
    async fn warm_up(&self) -> RosterResult<()> {
        self.connections.get_connection().await.map(drop)
    }

    async fn list(&self, kind: EntityKind) -> RosterResult<Vec<Entity>> {
        let pool = self.connections.get_connection().await?;
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM {} ORDER BY created_at DESC",
            kind.table()
        );

        sqlx::query_as::<_, Entity>(&sql)
            .fetch_all(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn find(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>> {
        let pool = self.connections.get_connection().await?;
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM {} WHERE id = $1", kind.table());

        sqlx::query_as::<_, Entity>(&sql)
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn insert(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Entity> {
        let pool = self.connections.get_connection().await?;
        let sql = format!(
            "INSERT INTO {} ({ENTITY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $5) RETURNING {ENTITY_COLUMNS}",
            kind.table()
        );

        sqlx::query_as::<_, Entity>(&sql)
            .bind(id)
            .bind(&record.name)
            .bind(record.age)
            .bind(&record.email)
            .bind(now)
            .fetch_one(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: Uuid,
        now: OffsetDateTime,
        record: &ValidRecord,
    ) -> RosterResult<Option<Entity>> {
        let pool = self.connections.get_connection().await?;
        let sql = format!(
            "UPDATE {} SET name = $2, age = $3, email = $4, updated_at = $5 WHERE id = $1 RETURNING {ENTITY_COLUMNS}",
            kind.table()
        );

        sqlx::query_as::<_, Entity>(&sql)
            .bind(id)
            .bind(&record.name)
            .bind(record.age)
            .bind(&record.email)
            .bind(now)
            .fetch_optional(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn remove(&self, kind: EntityKind, id: Uuid) -> RosterResult<Option<Entity>> {
        let pool = self.connections.get_connection().await?;
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {ENTITY_COLUMNS}",
            kind.table()
        );

        sqlx::query_as::<_, Entity>(&sql)
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn search(
        &self,
        kind: EntityKind,
        needle: &str,
        limit: i64,
    ) -> RosterResult<Vec<SearchHit>> {
        let pool = self.connections.get_connection().await?;
        let sql = format!(
            "SELECT name, age, email FROM {} WHERE name ILIKE $1 OR email ILIKE $1 ORDER BY name ASC LIMIT $2",
            kind.table()
        );

        sqlx::query_as::<_, SearchHit>(&sql)
            .bind(escape_like(needle))
            .bind(limit)
            .fetch_all(&pool)
            .await
            .map_err(|e| classify(kind, e))
    }

    async fn shutdown(&self) {
        self.connections.shutdown().await;
    }
}
