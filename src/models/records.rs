//! Typed rows for every backed-up collection.
//!
//! Each struct mirrors the column list of its table. Rows are stored in redb
//! with bincode and exported in backup documents as JSON, so the field lists
//! here are the single source of truth for both.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::Collection;

/// A row belonging to one of the permitted collections
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Primary key of the row
    fn id(&self) -> &str;

    /// Id of the user owning the row
    fn owner(&self) -> &str;

    /// Whether an owner may hold at most one row
    const ONE_PER_OWNER: bool = false;

    /// Email address no other owner's row may carry
    fn unique_email(&self) -> Option<&str> {
        None
    }
}

/// Practitioner profile; the profile id is the user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub office_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-user calendar credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIntegration {
    pub id: String,
    pub user_id: String,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_calendar_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub user_id: String,
    pub client_id: String,
    pub case_number: String,
    pub title: String,
    pub court: Option<String>,
    pub case_type: Option<String>,
    pub status: String,
    pub opened_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hearing {
    pub id: String,
    pub user_id: String,
    pub case_id: String,
    pub hearing_date: DateTime<Utc>,
    pub court_room: Option<String>,
    pub judge: Option<String>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub case_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: String,
    pub user_id: String,
    pub case_id: Option<String>,
    pub client_id: Option<String>,
    /// `income` or `expense`
    pub transaction_type: String,
    pub amount: f64,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjournment {
    pub id: String,
    pub user_id: String,
    pub case_id: String,
    pub hearing_id: Option<String>,
    pub previous_date: Option<DateTime<Utc>>,
    pub new_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub case_id: Option<String>,
    pub client_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a document attached to a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    pub id: String,
    pub user_id: String,
    pub case_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

macro_rules! owned_by_user_id {
    ($($ty:ty => $collection:expr),* $(,)?) => {
        $(
            impl Record for $ty {
                const COLLECTION: Collection = $collection;

                fn id(&self) -> &str {
                    &self.id
                }

                fn owner(&self) -> &str {
                    &self.user_id
                }
            }
        )*
    };
}

owned_by_user_id! {
    Client => Collection::Clients,
    Case => Collection::Cases,
    Hearing => Collection::Hearings,
    Task => Collection::Tasks,
    FinancialTransaction => Collection::FinancialTransactions,
    Adjournment => Collection::Adjournments,
    Note => Collection::Notes,
    CaseFile => Collection::CaseFiles,
}

impl Record for UserIntegration {
    const COLLECTION: Collection = Collection::UserIntegrations;
    const ONE_PER_OWNER: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }
}

impl Record for Profile {
    const COLLECTION: Collection = Collection::Profiles;
    const ONE_PER_OWNER: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.id
    }

    fn unique_email(&self) -> Option<&str> {
        Some(self.email.as_str())
    }
}
