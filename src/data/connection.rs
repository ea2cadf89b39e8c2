use crate::error::{ConnectionFailedSnafu, RosterResult};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use snafu::ResultExt;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Handle, sqlx::Error>;
    async fn close(&self, handle: Self::Handle);
}

type PendingConnection<H> = Shared<BoxFuture<'static, Result<H, Arc<sqlx::Error>>>>;

enum Slot<H> {
    Idle,
    Connecting {
        generation: u64,
        pending: PendingConnection<H>,
    },
    Ready(H),
}

struct SlotState<H> {
    slot: Slot<H>,
    generation: u64,
}

pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    state: Mutex<SlotState<C::Handle>>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            state: Mutex::new(SlotState {
                slot: Slot::Idle,
                generation: 0,
            }),
        }
    }

    #[cfg(test)]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn get_connection(&self) -> RosterResult<C::Handle> {
        let (generation, pending) = {
            let mut state = self.state.lock().await;
            let joined = match &state.slot {
                Slot::Ready(handle) => return Ok(handle.clone()),
                Slot::Connecting {
                    generation,
                    pending,
                } => (*generation, pending.clone()),
                Slot::Idle => {
                    state.generation += 1;
                    let generation = state.generation;

                    let connector = Arc::clone(&self.connector);
                    let pending = async move { connector.connect().await.map_err(Arc::new) }
                        .boxed()
                        .shared();

                    debug!(generation, "Starting database connection attempt");
                    state.slot = Slot::Connecting {
                        generation,
                        pending: pending.clone(),
                    };
                    (generation, pending)
                }
            };
            joined
        };

        let result = pending.await;

        let mut state = self.state.lock().await;
        let still_ours = matches!(
            &state.slot,
            Slot::Connecting { generation: current, .. } if *current == generation
        );

        if !still_ours {
            // shutdown took this attempt over and closes whatever it produced
            drop(state);
            debug!(generation, "Connection attempt finished after shutdown");
            let error = result
                .err()
                .unwrap_or_else(|| Arc::new(sqlx::Error::PoolClosed));
            return Err(error).context(ConnectionFailedSnafu);
        }

        state.slot = match &result {
            Ok(handle) => {
                info!(generation, "Database connection established");
                Slot::Ready(handle.clone())
            }
            Err(e) => {
                warn!(generation, ?e, "Database connection attempt failed");
                Slot::Idle
            }
        };
        drop(state);

        result.context(ConnectionFailedSnafu)
    }

    /// Waits out any in-flight attempt, then closes whatever handle resulted.
    pub async fn shutdown(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut state.slot, Slot::Idle)
        };

        match previous {
            Slot::Ready(handle) => {
                info!("Closing database connection");
                self.connector.close(handle).await;
            }
            Slot::Connecting {
                generation,
                pending,
            } => {
                debug!(generation, "Waiting on in-flight connection attempt before closing");
                if let Ok(handle) = pending.await {
                    info!(generation, "Closing database connection");
                    self.connector.close(handle).await;
                }
            }
            Slot::Idle => {}
        }
    }
}
