use crate::{
    config::RuntimeConfiguration,
    data::{
        EntityStore,
        entity::EntityKind,
        postgres::{PgConnector, PgStore},
        repository::Repository,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct RosterState {
    store: Arc<dyn EntityStore>,
    config: RuntimeConfiguration,
}

impl RosterState {
    pub fn new(config: RuntimeConfiguration) -> Self {
        let connector = PgConnector::new(config.db_config());

        Self::with_store(Arc::new(PgStore::new(connector)), config)
    }

    pub fn with_store(store: Arc<dyn EntityStore>, config: RuntimeConfiguration) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn repository(&self, kind: EntityKind) -> Repository<'_> {
        Repository::new(kind, self.store.as_ref())
    }

    pub async fn warm_up(&self) {
        match self.store.warm_up().await {
            Ok(()) => info!("Database ready"),
            Err(e) => warn!(?e, "Unable to reach database at startup, will retry on first request"),
        }
    }

    pub async fn sensible_shutdown(&self) {
        self.store.shutdown().await;
    }
}
