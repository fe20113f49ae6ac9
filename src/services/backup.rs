//! Backup creation, restore, listing and deletion.
//!
//! Restore runs collection by collection. Each collection is replaced in its
//! own transaction, so a failure leaves that collection untouched, but
//! collections restored before the failure stay restored.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::constants::WARN_BACKUP_SIZE_BYTES;
use crate::error::{AppError, Result};
use crate::models::{BackupDocument, BackupRecord, Collection};
use crate::repos::{BackupCatalog, BlobStore, CollectionStore};
use crate::AppState;

/// A stored backup and the collections it actually contains
#[derive(Debug, Clone)]
pub struct CreatedBackup {
    pub record: BackupRecord,
    pub tables: Vec<Collection>,
}

/// Outcome of restoring one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRestore {
    pub table: Collection,
    pub deleted: usize,
    pub inserted: usize,
    /// Rows in the document owned by someone other than the caller
    pub skipped_foreign: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub restored: Vec<CollectionRestore>,
    pub failed: Vec<Collection>,
}

pub struct BackupService {
    records: Arc<dyn CollectionStore>,
    catalog: Arc<dyn BackupCatalog>,
    blobs: Arc<dyn BlobStore>,
}

impl BackupService {
    pub fn new(
        records: Arc<dyn CollectionStore>,
        catalog: Arc<dyn BackupCatalog>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            records,
            catalog,
            blobs,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.records.clone(),
            state.catalog.clone(),
            state.blobs.clone(),
        )
    }

    /// Export the selected collections into a new stored backup
    ///
    /// An empty selection exports every collection. A collection that fails
    /// to load is left out of the document.
    pub async fn create(&self, user_id: &str, format: &str, tables: &[String]) -> Result<CreatedBackup> {
        BackupRecord::validate_format(format)?;
        let selected = Collection::parse_selection(tables)?;

        let mut document = BackupDocument::default();
        for collection in &selected {
            match self.records.fetch_owned(user_id, *collection).await {
                Ok(rows) => {
                    tracing::debug!("Exporting {} rows from {}", rows.len(), collection);
                    document.insert(rows);
                }
                Err(e) => {
                    tracing::error!("Failed to export {} for user {}: {}", collection, user_id, e);
                }
            }
        }

        let bytes = serde_json::to_vec(&document)?;
        if bytes.len() > WARN_BACKUP_SIZE_BYTES {
            tracing::info!("Large backup for user {}: {} bytes", user_id, bytes.len());
        }

        let record = BackupRecord::new(user_id, Utc::now(), bytes.len() as u64);
        self.blobs.put_new(&record.storage_path, bytes).await?;

        if let Err(e) = self.catalog.insert(&record).await {
            tracing::error!("Failed to record backup {}: {}", record.storage_path, e);
            // Compensate: the blob has no metadata row pointing at it
            if let Err(cleanup) = self.blobs.remove(&record.storage_path).await {
                tracing::error!(
                    "Failed to remove orphaned blob {}: {}",
                    record.storage_path,
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!(
            "Backup {} created for user {}: {} bytes",
            record.id,
            user_id,
            record.size
        );

        Ok(CreatedBackup {
            tables: document.collections(),
            record,
        })
    }

    /// Replace the caller's rows with the contents of a stored backup
    pub async fn restore(&self, user_id: &str, backup_id: &str) -> Result<RestoreReport> {
        let record = self.get(user_id, backup_id).await?;

        // The metadata row exists, so a missing blob is a storage fault
        let bytes = self
            .blobs
            .get(&record.storage_path)
            .await
            .map_err(|e| match e {
                AppError::BlobNotFound(path) => {
                    tracing::error!("Backup {} has no blob at {}", backup_id, path);
                    AppError::Storage(format!("Backup file {} is missing", path))
                }
                other => other,
            })?;
        let mut document: BackupDocument = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidDocument(e.to_string()))?;

        let mut report = RestoreReport::default();

        for collection in Collection::RESTORE_ORDER {
            let Some(mut rows) = document.take(collection) else {
                continue;
            };

            let skipped_foreign = rows.retain_owned_by(user_id);
            if skipped_foreign > 0 {
                tracing::warn!(
                    "Backup {} holds {} {} rows owned by other users, skipping them",
                    backup_id,
                    skipped_foreign,
                    collection
                );
            }

            match self.records.replace_owned(user_id, rows).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Restored {}: {} deleted, {} inserted",
                        collection,
                        outcome.deleted,
                        outcome.inserted
                    );
                    report.restored.push(CollectionRestore {
                        table: collection,
                        deleted: outcome.deleted,
                        inserted: outcome.inserted,
                        skipped_foreign,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to restore {} for user {}: {}", collection, user_id, e);
                    report.failed.push(collection);
                }
            }
        }

        tracing::info!(
            "Backup {} restored for user {}: {} collections, {} failed",
            backup_id,
            user_id,
            report.restored.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// The caller's backups, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<BackupRecord>> {
        self.catalog.list_owned(user_id).await
    }

    pub async fn get(&self, user_id: &str, backup_id: &str) -> Result<BackupRecord> {
        self.catalog
            .get_owned(user_id, backup_id)
            .await?
            .ok_or(AppError::BackupNotFound)
    }

    pub async fn read_blob(&self, storage_path: &str) -> Result<Vec<u8>> {
        self.blobs.get(storage_path).await
    }

    /// Remove the blob, then the metadata row
    ///
    /// If the blob cannot be removed the metadata row is left in place.
    pub async fn delete(&self, user_id: &str, backup_id: &str) -> Result<()> {
        let record = self.get(user_id, backup_id).await?;

        self.blobs.remove(&record.storage_path).await?;

        if !self.catalog.remove(user_id, backup_id).await? {
            tracing::warn!("Backup {} vanished before its metadata was removed", backup_id);
        }

        tracing::info!("Backup {} deleted for user {}", backup_id, user_id);
        Ok(())
    }
}
