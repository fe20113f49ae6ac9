use redb::TableDefinition;

use crate::models::Collection;

// Collection tables: "<owner>/<record id>" -> record (bincode)

pub const CLIENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("clients");
pub const CASES: TableDefinition<&str, &[u8]> = TableDefinition::new("cases");
pub const HEARINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("hearings");
pub const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");
pub const FINANCIAL_TRANSACTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("financial_transactions");
pub const ADJOURNMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("adjournments");
pub const NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("notes");
pub const CASE_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("case_files");
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
pub const USER_INTEGRATIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("user_integrations");

/// Backup metadata: "<owner>/<backup id>" -> BackupRecord (bincode)
pub const BACKUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("backups");

/// Storage path -> backup id, keeps storage paths unique
pub const BACKUP_PATHS: TableDefinition<&str, &str> = TableDefinition::new("backup_paths");

/// Profile email -> owning user id, keeps profile emails unique across users
pub const PROFILE_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("profile_emails");

/// Table holding the rows of `collection`
pub fn for_collection(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match collection {
        Collection::Clients => CLIENTS,
        Collection::Cases => CASES,
        Collection::Hearings => HEARINGS,
        Collection::Tasks => TASKS,
        Collection::FinancialTransactions => FINANCIAL_TRANSACTIONS,
        Collection::Adjournments => ADJOURNMENTS,
        Collection::Notes => NOTES,
        Collection::CaseFiles => CASE_FILES,
        Collection::Profiles => PROFILES,
        Collection::UserIntegrations => USER_INTEGRATIONS,
    }
}

/// Key of a row owned by `owner`
pub fn owned_key(owner: &str, id: &str) -> String {
    format!("{}/{}", owner, id)
}

/// Half-open key range covering every row owned by `owner`
///
/// `'0'` is the character right after `'/'`, so the range stops at the end
/// of the owner's prefix.
pub fn owner_range(owner: &str) -> (String, String) {
    (format!("{}/", owner), format!("{}0", owner))
}
