//! Keeps the room store connected, toggling degraded mode while the backend
//! is unreachable. Runs as a background task for the lifetime of the server.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{room_store::RoomStore, storage::StorageError},
    state::SharedState,
};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RECONNECT_ATTEMPTS: u32 = 3;

/// Exponential backoff between connection attempts, capped at a ceiling.
struct Backoff {
    delay: Duration,
}

impl Backoff {
    const FLOOR: Duration = Duration::from_secs(1);
    const CEILING: Duration = Duration::from_secs(10);

    fn new() -> Self {
        Self { delay: Self::FLOOR }
    }

    /// The delay to apply now; doubles the next one up to the ceiling.
    fn advance(&mut self) -> Duration {
        let current = self.delay;
        self.delay = (self.delay * 2).min(Self::CEILING);
        current
    }

    async fn wait(&mut self) {
        sleep(self.advance()).await;
    }

    fn reset(&mut self) {
        self.delay = Self::FLOOR;
    }
}

/// Establish a room store connection, watch its health until it is lost for
/// good, and start over. Never returns.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoomStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "room store connection failed");
                backoff.wait().await;
                continue;
            }
        };

        state.set_room_store(store.clone()).await;
        info!("room store connected");
        backoff.reset();

        watch_health(&state, store).await;
        warn!("room store lost; reconnecting from scratch");
        backoff.wait().await;
    }
}

/// Poll the store's health until a failure exhausts the reconnect budget.
async fn watch_health(state: &SharedState, store: Arc<dyn RoomStore>) {
    loop {
        sleep(HEALTH_POLL_INTERVAL).await;

        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("room store healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            continue;
        }

        state.update_degraded(true).await;
        if !reconnect_with_budget(&store).await {
            return;
        }
        state.update_degraded(false).await;
    }
}

async fn reconnect_with_budget(store: &Arc<dyn RoomStore>) -> bool {
    let mut backoff = Backoff::new();
    for attempt in 1..=RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "room store reconnected");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "room store reconnect attempt failed");
                backoff.wait().await;
            }
        }
    }
    warn!("exhausted room store reconnect attempts; staying degraded");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_to_the_ceiling_and_resets() {
        let mut backoff = Backoff::new();
        let delays: Vec<u64> = (0..6).map(|_| backoff.advance().as_secs()).collect();
        assert_eq!(delays, [1, 2, 4, 8, 10, 10]);

        backoff.reset();
        assert_eq!(backoff.advance(), Backoff::FLOOR);
    }
}
