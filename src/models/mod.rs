pub mod backup;
pub mod calendar;
pub mod collection;
pub mod document;
pub mod records;

pub use backup::BackupRecord;
pub use calendar::{CalendarEvent, OAuthTokens, ProviderEvent};
pub use collection::Collection;
pub use document::{BackupDocument, CollectionRows};
pub use records::{
    Adjournment, Case, CaseFile, Client, FinancialTransaction, Hearing, Note, Profile, Record,
    Task, UserIntegration,
};
