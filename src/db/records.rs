use async_trait::async_trait;
use redb::{Database, ReadableTable};

use super::{tables, Db};
use crate::error::{AppError, Result};
use crate::models::document::with_rows;
use crate::models::{Collection, CollectionRows, Profile, Record};
use crate::repos::{CollectionStore, ReplaceOutcome};

type RowTable<'txn> = redb::Table<'txn, &'static str, &'static [u8]>;
type EmailIndex<'txn> = redb::Table<'txn, &'static str, &'static str>;

/// [`CollectionStore`] over one redb table per collection
#[derive(Clone)]
pub struct RedbCollectionStore {
    db: Db,
}

impl RedbCollectionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

/// Read every row of `T` owned by `user_id`
pub(crate) fn load_owned<T: Record>(db: &Database, user_id: &str) -> Result<Vec<T>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::for_collection(T::COLLECTION))?;

    let (start, end) = tables::owner_range(user_id);
    let mut rows = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (_, value) = entry?;
        rows.push(bincode::deserialize(value.value())?);
    }

    Ok(rows)
}

/// Rows owned by `user_id` inside an open write transaction, with their keys
fn owned_entries<T: Record>(table: &RowTable<'_>, user_id: &str) -> Result<Vec<(String, T)>> {
    let (start, end) = tables::owner_range(user_id);
    let mut entries = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (key, value) = entry?;
        entries.push((key.value().to_string(), bincode::deserialize(value.value())?));
    }
    Ok(entries)
}

fn ensure_owned<T: Record>(user_id: &str, rows: &[T]) -> Result<()> {
    if let Some(row) = rows.iter().find(|r| r.owner() != user_id) {
        tracing::warn!(
            "Rejected {} row {} owned by another user",
            T::COLLECTION,
            row.id()
        );
        return Err(AppError::InvalidInput(format!(
            "Row {} in {} belongs to another user",
            row.id(),
            T::COLLECTION
        )));
    }
    Ok(())
}

/// Refuse a second row id for collections limited to one row per owner
fn ensure_single<T: Record>(existing_ids: &[String], rows: &[T]) -> Result<()> {
    if !T::ONE_PER_OWNER {
        return Ok(());
    }

    let mut ids: Vec<&str> = rows
        .iter()
        .map(|r| r.id())
        .chain(existing_ids.iter().map(String::as_str))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.len() > 1 {
        return Err(AppError::InvalidInput(format!(
            "Only one {} row is allowed per user",
            T::COLLECTION
        )));
    }
    Ok(())
}

/// Drop the index entries `user_id` holds for the emails of `rows`
fn release_emails<T: Record>(index: &mut EmailIndex<'_>, user_id: &str, rows: &[T]) -> Result<()> {
    for email in rows.iter().filter_map(|r| r.unique_email()) {
        let held = index
            .get(email)?
            .map(|holder| holder.value() == user_id)
            .unwrap_or(false);
        if held {
            index.remove(email)?;
        }
    }
    Ok(())
}

/// Point the emails of `rows` at `user_id`, refusing any another user holds
fn claim_emails<T: Record>(index: &mut EmailIndex<'_>, user_id: &str, rows: &[T]) -> Result<()> {
    for email in rows.iter().filter_map(|r| r.unique_email()) {
        let holder = index.get(email)?.map(|h| h.value().to_string());
        match holder {
            Some(holder) if holder != user_id => {
                tracing::warn!(
                    "User {} tried to claim email {} held by {}",
                    user_id,
                    email,
                    holder
                );
                return Err(AppError::Conflict(format!(
                    "Email {} is already used by another profile",
                    email
                )));
            }
            Some(_) => {}
            None => {
                index.insert(email, user_id)?;
            }
        }
    }
    Ok(())
}

/// Write `rows` into the caller's partition, returning how many keys were new
fn write_rows<T: Record>(table: &mut RowTable<'_>, user_id: &str, rows: &[T]) -> Result<usize> {
    let mut inserted = 0;
    for row in rows {
        let key = tables::owned_key(user_id, row.id());
        let bytes = bincode::serialize(row)?;
        if table.insert(key.as_str(), bytes.as_slice())?.is_none() {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Swap the caller's rows for `rows` in a single transaction
///
/// Nothing is written unless every row is owned by the caller and every
/// unique email is free.
fn replace_rows<T: Record>(db: &Database, user_id: &str, rows: &[T]) -> Result<ReplaceOutcome> {
    ensure_owned(user_id, rows)?;
    ensure_single(&[], rows)?;

    let write_txn = db.begin_write()?;
    let outcome = {
        let mut table = write_txn.open_table(tables::for_collection(T::COLLECTION))?;
        let mut emails = write_txn.open_table(tables::PROFILE_EMAILS)?;

        let previous: Vec<(String, T)> = owned_entries(&table, user_id)?;
        for (key, _) in &previous {
            table.remove(key.as_str())?;
        }
        let previous: Vec<T> = previous.into_iter().map(|(_, row)| row).collect();

        release_emails(&mut emails, user_id, &previous)?;
        claim_emails(&mut emails, user_id, rows)?;
        let inserted = write_rows(&mut table, user_id, rows)?;

        ReplaceOutcome {
            deleted: previous.len(),
            inserted,
        }
    };
    write_txn.commit()?;

    Ok(outcome)
}

fn upsert_rows<T: Record>(db: &Database, user_id: &str, rows: &[T]) -> Result<usize> {
    ensure_owned(user_id, rows)?;

    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::for_collection(T::COLLECTION))?;
        let mut emails = write_txn.open_table(tables::PROFILE_EMAILS)?;

        if T::ONE_PER_OWNER {
            let existing_ids: Vec<String> = owned_entries::<T>(&table, user_id)?
                .into_iter()
                .map(|(_, row)| row.id().to_string())
                .collect();
            ensure_single(&existing_ids, rows)?;
        }

        for row in rows {
            let key = tables::owned_key(user_id, row.id());
            let previous: Option<T> = table
                .get(key.as_str())?
                .map(|value| bincode::deserialize(value.value()))
                .transpose()?;
            if let Some(previous) = previous {
                release_emails(&mut emails, user_id, std::slice::from_ref(&previous))?;
            }
        }

        claim_emails(&mut emails, user_id, rows)?;
        write_rows(&mut table, user_id, rows)?;
    }
    write_txn.commit()?;

    Ok(rows.len())
}

fn load_rows(db: &Database, user_id: &str, collection: Collection) -> Result<CollectionRows> {
    let rows = match collection {
        Collection::Clients => CollectionRows::Clients(load_owned(db, user_id)?),
        Collection::Cases => CollectionRows::Cases(load_owned(db, user_id)?),
        Collection::Hearings => CollectionRows::Hearings(load_owned(db, user_id)?),
        Collection::Tasks => CollectionRows::Tasks(load_owned(db, user_id)?),
        Collection::FinancialTransactions => {
            CollectionRows::FinancialTransactions(load_owned(db, user_id)?)
        }
        Collection::Adjournments => CollectionRows::Adjournments(load_owned(db, user_id)?),
        Collection::Notes => CollectionRows::Notes(load_owned(db, user_id)?),
        Collection::CaseFiles => CollectionRows::CaseFiles(load_owned(db, user_id)?),
        Collection::Profiles => CollectionRows::Profiles(load_owned(db, user_id)?),
        Collection::UserIntegrations => CollectionRows::UserIntegrations(load_owned(db, user_id)?),
    };
    Ok(rows)
}

fn remove_row(db: &Database, user_id: &str, collection: Collection, id: &str) -> Result<bool> {
    let key = tables::owned_key(user_id, id);

    let write_txn = db.begin_write()?;
    let existed = {
        let mut table = write_txn.open_table(tables::for_collection(collection))?;
        let removed = table.remove(key.as_str())?.map(|value| value.value().to_vec());

        if let (Some(bytes), Collection::Profiles) = (&removed, collection) {
            let profile: Profile = bincode::deserialize(bytes)?;
            let mut emails = write_txn.open_table(tables::PROFILE_EMAILS)?;
            release_emails(&mut emails, user_id, std::slice::from_ref(&profile))?;
        }

        removed.is_some()
    };
    write_txn.commit()?;
    Ok(existed)
}

#[async_trait]
impl CollectionStore for RedbCollectionStore {
    async fn fetch_owned(&self, user_id: &str, collection: Collection) -> Result<CollectionRows> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || load_rows(&db, &user_id, collection)).await?
    }

    async fn replace_owned(&self, user_id: &str, rows: CollectionRows) -> Result<ReplaceOutcome> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || with_rows!(&rows, r => replace_rows(&db, &user_id, r)))
            .await?
    }

    async fn upsert(&self, user_id: &str, rows: CollectionRows) -> Result<usize> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || with_rows!(&rows, r => upsert_rows(&db, &user_id, r)))
            .await?
    }

    async fn remove(&self, user_id: &str, collection: Collection, id: &str) -> Result<bool> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let id = id.to_string();

        tokio::task::spawn_blocking(move || remove_row(&db, &user_id, collection, &id)).await?
    }
}
