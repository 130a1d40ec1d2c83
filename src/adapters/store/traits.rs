//! Storage abstraction traits
//!
//! This module defines the traits that storage adapters must implement to
//! persist tracker entities for Intake.

use crate::domain::entities::StoredEntity;
use crate::domain::ids::Uid;
use crate::domain::Result;
use async_trait::async_trait;

/// Read access to persisted tracker entities and the entry point for writes
///
/// Every write happens inside a [`StoreTransaction`] obtained from
/// [`TrackerStore::begin`]; one transaction covers exactly one record.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Check whether an entity with the given uid exists (deleted or not)
    async fn exists_by_uid(&self, uid: &Uid) -> Result<bool>;

    /// Fetch an entity by uid
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(entity))` if found, `Ok(None)` if not found.
    async fn get_by_uid(&self, uid: &Uid) -> Result<Option<StoredEntity>>;

    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Unit of work for a single record
///
/// Changes become visible only after [`StoreTransaction::commit`]. Dropping a
/// transaction without committing discards its changes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insert a new entity
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::StoreError::Conflict`] if the uid is taken.
    async fn save(&mut self, entity: StoredEntity) -> Result<()>;

    /// Replace an existing entity
    async fn update(&mut self, entity: StoredEntity) -> Result<()>;

    /// Soft-delete an entity
    async fn delete(&mut self, uid: &Uid) -> Result<()>;

    /// Mark a file resource as assigned to a saved value
    async fn assign_file_resource(&mut self, file_resource: &str) -> Result<()>;

    /// Make the transaction's changes durable
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard the transaction's changes
    async fn rollback(self: Box<Self>) -> Result<()>;
}
