pub mod backup;
pub mod calendar;
pub mod health;
pub mod records;
pub mod validation;

pub use backup::{
    create_backup, create_download_link, delete_backup, download_backup, list_backups,
    restore_backup,
};
pub use calendar::{calendar_auth, calendar_callback, calendar_disconnect, calendar_events};
pub use health::health_check;
pub use records::{delete_record, list_records, upsert_record};
pub use validation::{ensure_same_user, parse_collection, timestamp_to_rfc3339};
