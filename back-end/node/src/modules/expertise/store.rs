use super::model::Expertise;
use tokio::sync::RwLock;
use tracing::debug;

/// Append-only, in-memory collection of locally known expertise.
///
/// Readers share the lock; an append holds it exclusively, so a snapshot can
/// never see a half-written record.
#[derive(Debug, Default)]
pub struct ExpertiseStore {
    entries: RwLock<Vec<Expertise>>,
}

impl ExpertiseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the end of the collection.
    pub async fn append(&self, expertise: Expertise) {
        let mut entries = self.entries.write().await;
        entries.push(expertise);
        debug!(total = entries.len(), "Expertise appended to store");
    }

    /// Point-in-time copy of every record, in insertion order.
    pub async fn snapshot(&self) -> Vec<Expertise> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
