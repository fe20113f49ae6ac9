pub mod backup;
pub mod calendar;

pub use backup::{BackupService, CollectionRestore, CreatedBackup, RestoreReport};
pub use calendar::CalendarBridge;
