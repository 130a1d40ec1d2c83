//! In-memory tracker store
//!
//! Reference [`TrackerStore`] implementation used by the CLI and the tests.
//! Transactions buffer their writes and apply them under a single lock on
//! commit.

use super::traits::{StoreTransaction, TrackerStore};
use crate::domain::entities::StoredEntity;
use crate::domain::errors::StoreError;
use crate::domain::ids::Uid;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct StoreState {
    entities: HashMap<Uid, StoredEntity>,
    assigned_file_resources: HashSet<String>,
    write_failures: HashSet<Uid>,
    commits: usize,
}

/// Tracker store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given entities
    pub fn with_entities(entities: impl IntoIterator<Item = StoredEntity>) -> Self {
        let state = StoreState {
            entities: entities
                .into_iter()
                .map(|e| (e.uid().clone(), e))
                .collect(),
            ..StoreState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Makes every write of the given uid fail
    pub async fn fail_writes_for(&self, uid: Uid) {
        self.state.lock().await.write_failures.insert(uid);
    }

    /// Snapshot of a stored entity
    pub async fn get(&self, uid: &str) -> Option<StoredEntity> {
        self.state.lock().await.entities.get(uid).cloned()
    }

    /// Number of stored entities, including soft-deleted ones
    pub async fn len(&self) -> usize {
        self.state.lock().await.entities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether the file resource has been assigned
    pub async fn is_file_resource_assigned(&self, file_resource: &str) -> bool {
        self.state
            .lock()
            .await
            .assigned_file_resources
            .contains(file_resource)
    }

    /// Number of committed transactions
    pub async fn commit_count(&self) -> usize {
        self.state.lock().await.commits
    }
}

#[async_trait]
impl TrackerStore for InMemoryStore {
    async fn exists_by_uid(&self, uid: &Uid) -> Result<bool> {
        Ok(self.state.lock().await.entities.contains_key(uid))
    }

    async fn get_by_uid(&self, uid: &Uid) -> Result<Option<StoredEntity>> {
        Ok(self.state.lock().await.entities.get(uid).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum PendingWrite {
    Save(StoredEntity),
    Update(StoredEntity),
    Delete(Uid),
    AssignFileResource(String),
}

/// Transaction over an [`InMemoryStore`]
#[derive(Debug)]
pub struct InMemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    pending: Vec<PendingWrite>,
}

impl InMemoryTransaction {
    async fn check_writable(&self, uid: &Uid) -> Result<()> {
        if self.state.lock().await.write_failures.contains(uid) {
            return Err(StoreError::WriteFailed(format!("Write rejected for {uid}")).into());
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn save(&mut self, entity: StoredEntity) -> Result<()> {
        self.check_writable(entity.uid()).await?;
        self.pending.push(PendingWrite::Save(entity));
        Ok(())
    }

    async fn update(&mut self, entity: StoredEntity) -> Result<()> {
        self.check_writable(entity.uid()).await?;
        self.pending.push(PendingWrite::Update(entity));
        Ok(())
    }

    async fn delete(&mut self, uid: &Uid) -> Result<()> {
        self.check_writable(uid).await?;
        self.pending.push(PendingWrite::Delete(uid.clone()));
        Ok(())
    }

    async fn assign_file_resource(&mut self, file_resource: &str) -> Result<()> {
        self.pending
            .push(PendingWrite::AssignFileResource(file_resource.to_string()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { state, pending } = *self;
        let mut state = state.lock().await;

        // Validate everything first so a failing write leaves no partial state
        let mut created: HashSet<&Uid> = HashSet::new();
        for write in &pending {
            match write {
                PendingWrite::Save(entity) => {
                    if state.entities.contains_key(entity.uid()) || !created.insert(entity.uid()) {
                        return Err(StoreError::Conflict(format!(
                            "Entity already exists: {}",
                            entity.uid()
                        ))
                        .into());
                    }
                }
                PendingWrite::Update(entity) => {
                    if !state.entities.contains_key(entity.uid()) && !created.contains(entity.uid()) {
                        return Err(StoreError::NotFound(entity.uid().to_string()).into());
                    }
                }
                PendingWrite::Delete(uid) => {
                    if !state.entities.contains_key(uid) && !created.contains(uid) {
                        return Err(StoreError::NotFound(uid.to_string()).into());
                    }
                }
                PendingWrite::AssignFileResource(_) => {}
            }
        }

        for write in pending {
            match write {
                PendingWrite::Save(entity) | PendingWrite::Update(entity) => {
                    state.entities.insert(entity.uid().clone(), entity);
                }
                PendingWrite::Delete(uid) => {
                    if let Some(entity) = state.entities.get_mut(&uid) {
                        entity.mark_deleted();
                    }
                }
                PendingWrite::AssignFileResource(file_resource) => {
                    state.assigned_file_resources.insert(file_resource);
                }
            }
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        tracing::debug!(discarded = self.pending.len(), "Transaction rolled back");
        Ok(())
    }
}
