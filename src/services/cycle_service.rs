//! One fetch → detect → persist → notify pass over every source.
//!
//! Each source is polled in its own task against a snapshot of the state.
//! A source that fails or panics contributes nothing and keeps its old
//! watermark; the others are unaffected. State is persisted once every task
//! has settled, and only then are messages delivered, oldest first.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::domain::{OutboundMessage, ReleaseRecord, WatermarkState};
use crate::services::formatter::build_message;
use crate::services::notification_service::Notifier;
use crate::sources::{Fetcher, SourceRegistry, SourceUpdate};
use crate::storage::WatermarkStore;

/// Consecutive failed cycles after which a source is reported at error level
pub const FAILURE_ESCALATION_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub detected: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub failed_sources: Vec<String>,
    pub persisted: bool,
}

/// Messages of a cycle whose state has been persisted but not yet delivered
#[derive(Debug)]
pub struct PendingDelivery {
    pub messages: Vec<OutboundMessage>,
    pub report: CycleReport,
}

pub struct CycleService<S: WatermarkStore> {
    registry: SourceRegistry,
    fetcher: Arc<dyn Fetcher>,
    store: S,
    /// `None` runs detection without delivering anything
    notifier: Option<Box<dyn Notifier>>,
    consecutive_failures: HashMap<String, u32>,
}

impl<S: WatermarkStore> CycleService<S> {
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn Fetcher>,
        store: S,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            notifier,
            consecutive_failures: HashMap::new(),
        }
    }

    /// Run one cycle and return the advanced state
    pub async fn run(&mut self, state: WatermarkState) -> (WatermarkState, CycleReport) {
        let (state, pending) = self.detect_and_persist(state).await;
        let report = self.deliver(pending).await;
        (state, report)
    }

    /// Poll, detect and persist; the returned state is already on disk
    ///
    /// Callers must keep the returned state even when delivery goes wrong,
    /// otherwise the next cycle announces the same releases again.
    pub async fn detect_and_persist(
        &mut self,
        mut state: WatermarkState,
    ) -> (WatermarkState, PendingDelivery) {
        let mut report = CycleReport::default();

        let updates = self.poll_sources(&state).await;

        let mut records: Vec<ReleaseRecord> = Vec::new();
        for (source, update) in self.registry.sources().iter().zip(updates) {
            match update {
                Some(update) => {
                    update.apply(&mut state);
                    records.extend(update.fresh);
                }
                None => report.failed_sources.push(source.key().to_string()),
            }
        }
        self.track_failures(&report.failed_sources);

        // Sources list newest first. Reversing gives oldest first per source,
        // the stable sort then interleaves sources by publication time.
        records.reverse();
        records.sort_by_key(|r| r.published_at);
        let messages: Vec<OutboundMessage> = records.iter().map(build_message).collect();
        report.detected = messages.len();

        match self.store.save(&state) {
            Ok(()) => report.persisted = true,
            Err(e) => error!(error = %e, "failed to persist watermarks, releases may be announced again"),
        }

        (state, PendingDelivery { messages, report })
    }

    /// Send the messages of a persisted cycle and finish its report
    pub async fn deliver(&self, pending: PendingDelivery) -> CycleReport {
        let PendingDelivery {
            messages,
            mut report,
        } = pending;

        self.send_all(&messages, &mut report).await;

        info!(
            detected = report.detected,
            delivered = report.delivered,
            failed_deliveries = report.failed_deliveries,
            failed_sources = report.failed_sources.len(),
            "cycle complete"
        );

        report
    }

    /// Poll every source concurrently; the result is indexed like the registry
    async fn poll_sources(&self, state: &WatermarkState) -> Vec<Option<SourceUpdate>> {
        let sources = self.registry.sources();
        let snapshot = Arc::new(state.clone());
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().enumerate() {
            let source = Arc::clone(source);
            let fetcher = Arc::clone(&self.fetcher);
            let snapshot = Arc::clone(&snapshot);

            tasks.spawn(async move {
                let result = source.poll(fetcher.as_ref(), &snapshot).await;
                (index, result)
            });
        }

        let mut updates: Vec<Option<SourceUpdate>> = (0..sources.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(update))) => {
                    if !update.fresh.is_empty() {
                        info!(source = %update.source_key, count = update.fresh.len(), "new releases detected");
                    }
                    updates[index] = Some(update);
                }
                Ok((index, Err(e))) => {
                    warn!(source = %sources[index].key(), error = %e, "source failed this cycle");
                }
                Err(e) => {
                    error!(error = %e, "source task did not complete");
                }
            }
        }

        updates
    }

    fn track_failures(&mut self, failed: &[String]) {
        for source in self.registry.sources() {
            let key = source.key();
            if !failed.iter().any(|f| f == key) {
                self.consecutive_failures.remove(key);
                continue;
            }

            let count = self
                .consecutive_failures
                .entry(key.to_string())
                .or_insert(0);
            *count += 1;

            if *count % FAILURE_ESCALATION_THRESHOLD == 0 {
                error!(
                    source = %key,
                    consecutive_failures = *count,
                    "source keeps failing, its page or feed may have changed"
                );
            }
        }
    }

    pub fn consecutive_failures(&self, key: &str) -> u32 {
        self.consecutive_failures.get(key).copied().unwrap_or(0)
    }

    async fn send_all(&self, messages: &[OutboundMessage], report: &mut CycleReport) {
        let Some(notifier) = self.notifier.as_ref() else {
            for message in messages {
                info!("[DEBUG] would send: {}", message.format());
            }
            return;
        };

        for message in messages {
            match notifier.send(message).await {
                Ok(()) => {
                    report.delivered += 1;
                    info!("sent: {}", message.format());
                }
                Err(e) => {
                    // The watermark has already moved; this one is not retried
                    report.failed_deliveries += 1;
                    error!(title = %message.title, error = %e, "failed to deliver notification");
                }
            }
        }
    }
}
