use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info};

use crate::domain::WatermarkState;
use crate::services::cycle_service::CycleService;
use crate::storage::WatermarkStore;

/// Runs cycles back to back with a fixed pause between them.
///
/// The pause starts when a cycle finishes, so a slow cycle pushes every later
/// one back. A cycle that panics before persisting is logged and the previous
/// state is kept; once the state is persisted it is kept even if delivery
/// panics.
pub struct Scheduler<S: WatermarkStore> {
    cycle: CycleService<S>,
    interval: Duration,
    once: bool,
}

impl<S: WatermarkStore> Scheduler<S> {
    pub fn new(cycle: CycleService<S>, interval: Duration, once: bool) -> Self {
        Self {
            cycle,
            interval,
            once,
        }
    }

    /// Run until ctrl-c, or for a single cycle in run-once mode
    pub async fn run(mut self, initial: WatermarkState) -> WatermarkState {
        let mut state = initial;
        let mut cycle_number: u64 = 0;

        // One listener for the whole run so a ctrl-c during a cycle is seen
        // at the next pause
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            cycle_number += 1;
            info!(cycle = cycle_number, "starting cycle");

            match AssertUnwindSafe(self.cycle.detect_and_persist(state.clone()))
                .catch_unwind()
                .await
            {
                Ok((next, pending)) => {
                    state = next;
                    if let Err(panic) = AssertUnwindSafe(self.cycle.deliver(pending))
                        .catch_unwind()
                        .await
                    {
                        error!(cycle = cycle_number, "delivery aborted: {}", panic_message(&*panic));
                    }
                }
                Err(panic) => {
                    error!(cycle = cycle_number, "cycle aborted: {}", panic_message(&*panic));
                }
            }

            if self.once {
                break;
            }

            info!("next cycle in {:?}", self.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("interrupted, shutting down");
                    break;
                }
            }
        }

        state
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
