use super::channel::BroadcastChannel;
use super::envelope;
use super::error::GossipError;
use crate::modules::expertise::{Expertise, ExpertiseStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Outcome of one pass over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub published: usize,
    pub failed: usize,
}

/// Pushes locally known expertise onto the broadcast channel.
pub struct GossipPublisher {
    store: Arc<ExpertiseStore>,
    channel: Arc<dyn BroadcastChannel>,
}

impl GossipPublisher {
    pub fn new(store: Arc<ExpertiseStore>, channel: Arc<dyn BroadcastChannel>) -> Self {
        Self { store, channel }
    }

    /// Broadcast a single record. Not retried.
    pub async fn publish_one(&self, expertise: &Expertise) -> Result<(), GossipError> {
        let payload = envelope::encode(expertise)?;
        let bytes = payload.len();

        self.channel.publish(payload).await?;

        info!(
            embeddings = expertise.len(),
            bytes, "Gossiped expertise"
        );
        Ok(())
    }

    /// Broadcast every record in a store snapshot, continuing past failures.
    pub async fn publish_all(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();

        for expertise in self.store.snapshot().await {
            match self.publish_one(&expertise).await {
                Ok(()) => summary.published += 1,
                Err(e) if e.is_unheard() => {
                    debug!(error = %e, "Expertise not gossiped, no listeners yet");
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to gossip expertise");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Re-broadcast the whole store every `interval` until the task is aborted.
    ///
    /// The first pass runs one interval after spawn.
    pub fn spawn_sweep(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_secs = interval.as_secs(), "Gossip sweep started");

            loop {
                ticker.tick().await;

                if self.store.is_empty().await {
                    debug!("Expertise store empty, skipping gossip sweep");
                    continue;
                }

                let summary = self.publish_all().await;
                debug!(
                    published = summary.published,
                    failed = summary.failed,
                    "Gossip sweep finished"
                );
            }
        })
    }
}
