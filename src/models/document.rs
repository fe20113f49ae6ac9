use serde::{Deserialize, Serialize};

use super::records::*;
use super::Collection;

/// The rows of a single collection, tagged by collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CollectionRows {
    Clients(Vec<Client>),
    Cases(Vec<Case>),
    Hearings(Vec<Hearing>),
    Tasks(Vec<Task>),
    FinancialTransactions(Vec<FinancialTransaction>),
    Adjournments(Vec<Adjournment>),
    Notes(Vec<Note>),
    CaseFiles(Vec<CaseFile>),
    Profiles(Vec<Profile>),
    UserIntegrations(Vec<UserIntegration>),
}

/// Apply the same expression to whichever vector a `CollectionRows` holds
macro_rules! with_rows {
    ($value:expr, $rows:ident => $body:expr) => {
        match $value {
            CollectionRows::Clients($rows) => $body,
            CollectionRows::Cases($rows) => $body,
            CollectionRows::Hearings($rows) => $body,
            CollectionRows::Tasks($rows) => $body,
            CollectionRows::FinancialTransactions($rows) => $body,
            CollectionRows::Adjournments($rows) => $body,
            CollectionRows::Notes($rows) => $body,
            CollectionRows::CaseFiles($rows) => $body,
            CollectionRows::Profiles($rows) => $body,
            CollectionRows::UserIntegrations($rows) => $body,
        }
    };
}

pub(crate) use with_rows;

impl CollectionRows {
    /// An empty row set for `collection`
    pub fn empty(collection: Collection) -> Self {
        match collection {
            Collection::Clients => CollectionRows::Clients(Vec::new()),
            Collection::Cases => CollectionRows::Cases(Vec::new()),
            Collection::Hearings => CollectionRows::Hearings(Vec::new()),
            Collection::Tasks => CollectionRows::Tasks(Vec::new()),
            Collection::FinancialTransactions => CollectionRows::FinancialTransactions(Vec::new()),
            Collection::Adjournments => CollectionRows::Adjournments(Vec::new()),
            Collection::Notes => CollectionRows::Notes(Vec::new()),
            Collection::CaseFiles => CollectionRows::CaseFiles(Vec::new()),
            Collection::Profiles => CollectionRows::Profiles(Vec::new()),
            Collection::UserIntegrations => CollectionRows::UserIntegrations(Vec::new()),
        }
    }

    /// Parse `value` (an array of rows or a single row object) against the
    /// schema of `collection`
    pub fn from_json(collection: Collection, value: serde_json::Value) -> serde_json::Result<Self> {
        let value = match value {
            serde_json::Value::Array(_) => value,
            single => serde_json::Value::Array(vec![single]),
        };

        let rows = match collection {
            Collection::Clients => CollectionRows::Clients(serde_json::from_value(value)?),
            Collection::Cases => CollectionRows::Cases(serde_json::from_value(value)?),
            Collection::Hearings => CollectionRows::Hearings(serde_json::from_value(value)?),
            Collection::Tasks => CollectionRows::Tasks(serde_json::from_value(value)?),
            Collection::FinancialTransactions => {
                CollectionRows::FinancialTransactions(serde_json::from_value(value)?)
            }
            Collection::Adjournments => {
                CollectionRows::Adjournments(serde_json::from_value(value)?)
            }
            Collection::Notes => CollectionRows::Notes(serde_json::from_value(value)?),
            Collection::CaseFiles => CollectionRows::CaseFiles(serde_json::from_value(value)?),
            Collection::Profiles => CollectionRows::Profiles(serde_json::from_value(value)?),
            Collection::UserIntegrations => {
                CollectionRows::UserIntegrations(serde_json::from_value(value)?)
            }
        };

        Ok(rows)
    }

    pub fn collection(&self) -> Collection {
        match self {
            CollectionRows::Clients(_) => Collection::Clients,
            CollectionRows::Cases(_) => Collection::Cases,
            CollectionRows::Hearings(_) => Collection::Hearings,
            CollectionRows::Tasks(_) => Collection::Tasks,
            CollectionRows::FinancialTransactions(_) => Collection::FinancialTransactions,
            CollectionRows::Adjournments(_) => Collection::Adjournments,
            CollectionRows::Notes(_) => Collection::Notes,
            CollectionRows::CaseFiles(_) => Collection::CaseFiles,
            CollectionRows::Profiles(_) => Collection::Profiles,
            CollectionRows::UserIntegrations(_) => Collection::UserIntegrations,
        }
    }

    pub fn len(&self) -> usize {
        with_rows!(self, rows => rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the contained rows, in order
    pub fn ids(&self) -> Vec<String> {
        with_rows!(self, rows => rows.iter().map(|r| r.id().to_string()).collect())
    }

    /// Drop every row not owned by `user_id`, returning how many were dropped
    pub fn retain_owned_by(&mut self, user_id: &str) -> usize {
        with_rows!(self, rows => {
            let before = rows.len();
            rows.retain(|r| r.owner() == user_id);
            before - rows.len()
        })
    }
}

/// A full backup: collection name -> rows as they were at backup time
///
/// Only collections that were exported are present. Unknown top-level keys
/// are ignored on parse, so a document can never target a table outside the
/// permitted set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Client>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<Case>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hearings: Option<Vec<Hearing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_transactions: Option<Vec<FinancialTransaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjournments: Option<Vec<Adjournment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_files: Option<Vec<CaseFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_integrations: Option<Vec<UserIntegration>>,
}

impl BackupDocument {
    /// Store `rows` under their collection, replacing anything already there
    pub fn insert(&mut self, rows: CollectionRows) {
        match rows {
            CollectionRows::Clients(r) => self.clients = Some(r),
            CollectionRows::Cases(r) => self.cases = Some(r),
            CollectionRows::Hearings(r) => self.hearings = Some(r),
            CollectionRows::Tasks(r) => self.tasks = Some(r),
            CollectionRows::FinancialTransactions(r) => self.financial_transactions = Some(r),
            CollectionRows::Adjournments(r) => self.adjournments = Some(r),
            CollectionRows::Notes(r) => self.notes = Some(r),
            CollectionRows::CaseFiles(r) => self.case_files = Some(r),
            CollectionRows::Profiles(r) => self.profiles = Some(r),
            CollectionRows::UserIntegrations(r) => self.user_integrations = Some(r),
        }
    }

    /// Remove and return the rows for `collection`, if the document has them
    pub fn take(&mut self, collection: Collection) -> Option<CollectionRows> {
        match collection {
            Collection::Clients => self.clients.take().map(CollectionRows::Clients),
            Collection::Cases => self.cases.take().map(CollectionRows::Cases),
            Collection::Hearings => self.hearings.take().map(CollectionRows::Hearings),
            Collection::Tasks => self.tasks.take().map(CollectionRows::Tasks),
            Collection::FinancialTransactions => self
                .financial_transactions
                .take()
                .map(CollectionRows::FinancialTransactions),
            Collection::Adjournments => self.adjournments.take().map(CollectionRows::Adjournments),
            Collection::Notes => self.notes.take().map(CollectionRows::Notes),
            Collection::CaseFiles => self.case_files.take().map(CollectionRows::CaseFiles),
            Collection::Profiles => self.profiles.take().map(CollectionRows::Profiles),
            Collection::UserIntegrations => self
                .user_integrations
                .take()
                .map(CollectionRows::UserIntegrations),
        }
    }

    /// Collections present in the document, in export order
    pub fn collections(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| match c {
                Collection::Clients => self.clients.is_some(),
                Collection::Cases => self.cases.is_some(),
                Collection::Hearings => self.hearings.is_some(),
                Collection::Tasks => self.tasks.is_some(),
                Collection::FinancialTransactions => self.financial_transactions.is_some(),
                Collection::Adjournments => self.adjournments.is_some(),
                Collection::Notes => self.notes.is_some(),
                Collection::CaseFiles => self.case_files.is_some(),
                Collection::Profiles => self.profiles.is_some(),
                Collection::UserIntegrations => self.user_integrations.is_some(),
            })
            .collect()
    }
}
