//! Client-API notification about expertise received from peers.
//!
//! Notifications are fire-and-forget: the subscriber hands them to a bounded
//! [`NotificationQueue`], and a worker delivers them with a capped number of
//! calls in flight. When the queue is full the notification is dropped.

use super::error::NotifyError;
use crate::modules::expertise::{Embedding, Expertise};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receiver of "peer X advertised this expertise" events.
#[async_trait]
pub trait ExpertiseNotifier: Send + Sync {
    async fn notify(&self, sender: &str, expertise: &Expertise) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationBody<'a> {
    node_id: &'a str,
    embeddings: &'a [Embedding],
}

/// Posts notifications to `<client_api_url>/expertise`.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(client_api_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/expertise", client_api_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExpertiseNotifier for HttpNotifier {
    async fn notify(&self, sender: &str, expertise: &Expertise) -> Result<(), NotifyError> {
        let body = NotificationBody {
            node_id: sender,
            embeddings: &expertise.embeddings,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// Limits for the notification worker.
#[derive(Debug, Clone)]
pub struct NotificationQueueConfig {
    pub capacity: usize,
    pub max_in_flight: usize,
    pub timeout: Duration,
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_in_flight: 16,
            timeout: Duration::from_secs(5),
        }
    }
}

struct Notification {
    sender: String,
    expertise: Expertise,
}

/// Producer handle for the notification worker.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Spawn the worker and return the queue feeding it.
    ///
    /// The worker exits once every queue handle has been dropped.
    pub fn spawn(
        notifier: Arc<dyn ExpertiseNotifier>,
        config: &NotificationQueueConfig,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let handle = tokio::spawn(run_worker(
            rx,
            notifier,
            config.max_in_flight.max(1),
            config.timeout,
        ));
        (Self { tx }, handle)
    }

    /// Enqueue without waiting. Returns false when the notification was dropped.
    pub fn submit(&self, sender: String, expertise: Expertise) -> bool {
        match self.tx.try_send(Notification { sender, expertise }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(
                    sender = %dropped.sender,
                    "Notification queue full, dropping notification"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(
                    sender = %dropped.sender,
                    "Notification worker stopped, dropping notification"
                );
                false
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Notification>,
    notifier: Arc<dyn ExpertiseNotifier>,
    max_in_flight: usize,
    timeout: Duration,
) {
    let permits = Arc::new(Semaphore::new(max_in_flight));
    debug!(max_in_flight, "Notification worker started");

    while let Some(notification) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let notifier = Arc::clone(&notifier);

        tokio::spawn(async move {
            let _permit = permit;
            deliver(notifier.as_ref(), notification, timeout).await;
        });
    }

    debug!("Notification worker stopped");
}

async fn deliver(notifier: &dyn ExpertiseNotifier, notification: Notification, timeout: Duration) {
    let Notification { sender, expertise } = notification;

    let result = match tokio::time::timeout(timeout, notifier.notify(&sender, &expertise)).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::Timeout {
            timeout_secs: timeout.as_secs(),
        }),
    };

    match result {
        Ok(()) => info!(
            sender = %sender,
            embeddings = expertise.len(),
            "Notified client API about gossiped expertise"
        ),
        Err(e) => warn!(sender = %sender, error = %e, "Failed to notify client API"),
    }
}
