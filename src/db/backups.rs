use async_trait::async_trait;
use redb::ReadableTable;

use super::{tables, Db};
use crate::error::{AppError, Result};
use crate::models::BackupRecord;
use crate::repos::BackupCatalog;

/// [`BackupCatalog`] over the `backups` and `backup_paths` tables
#[derive(Clone)]
pub struct RedbBackupCatalog {
    db: Db,
}

impl RedbBackupCatalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BackupCatalog for RedbBackupCatalog {
    async fn insert(&self, record: &BackupRecord) -> Result<()> {
        let db = self.db.clone();
        let record = record.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;
            {
                let mut paths = write_txn.open_table(tables::BACKUP_PATHS)?;
                if paths.get(record.storage_path.as_str())?.is_some() {
                    return Err(AppError::Storage(format!(
                        "Storage path already in use: {}",
                        record.storage_path
                    )));
                }
                paths.insert(record.storage_path.as_str(), record.id.as_str())?;
                drop(paths);

                let mut backups = write_txn.open_table(tables::BACKUPS)?;
                let key = tables::owned_key(&record.user_id, &record.id);
                let bytes = bincode::serialize(&record)?;
                backups.insert(key.as_str(), bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?
    }

    async fn get_owned(&self, user_id: &str, backup_id: &str) -> Result<Option<BackupRecord>> {
        let db = self.db.clone();
        let key = tables::owned_key(user_id, backup_id);

        tokio::task::spawn_blocking(move || -> Result<Option<BackupRecord>> {
            let read_txn = db.begin_read()?;
            let backups = read_txn.open_table(tables::BACKUPS)?;

            let record = backups
                .get(key.as_str())?
                .map(|b| bincode::deserialize(b.value()))
                .transpose()?;
            Ok(record)
        })
        .await?
    }

    async fn list_owned(&self, user_id: &str) -> Result<Vec<BackupRecord>> {
        let db = self.db.clone();
        let (start, end) = tables::owner_range(user_id);

        tokio::task::spawn_blocking(move || -> Result<Vec<BackupRecord>> {
            let read_txn = db.begin_read()?;
            let backups = read_txn.open_table(tables::BACKUPS)?;

            let mut records = Vec::new();
            for entry in backups.range(start.as_str()..end.as_str())? {
                let (_, value) = entry?;
                records.push(bincode::deserialize::<BackupRecord>(value.value())?);
            }

            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        })
        .await?
    }

    async fn remove(&self, user_id: &str, backup_id: &str) -> Result<bool> {
        let db = self.db.clone();
        let key = tables::owned_key(user_id, backup_id);

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            let existed = {
                let mut backups = write_txn.open_table(tables::BACKUPS)?;
                let removed: Option<BackupRecord> = backups
                    .remove(key.as_str())?
                    .map(|b| bincode::deserialize(b.value()))
                    .transpose()?;
                drop(backups);

                match removed {
                    Some(record) => {
                        let mut paths = write_txn.open_table(tables::BACKUP_PATHS)?;
                        paths.remove(record.storage_path.as_str())?;
                        true
                    }
                    None => false,
                }
            };
            write_txn.commit()?;
            Ok(existed)
        })
        .await?
    }
}
