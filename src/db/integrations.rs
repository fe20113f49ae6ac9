use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableTable};

use super::records::load_owned;
use super::{tables, Db};
use crate::error::{AppError, Result};
use crate::models::{Profile, UserIntegration};
use crate::repos::IntegrationStore;

/// [`IntegrationStore`] over the `user_integrations` and `profiles` tables
#[derive(Clone)]
pub struct RedbIntegrationStore {
    db: Db,
}

impl RedbIntegrationStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn current(db: &Database, user_id: &str) -> Result<Option<UserIntegration>> {
    Ok(load_owned::<UserIntegration>(db, user_id)?.into_iter().next())
}

fn save(db: &Database, integration: &UserIntegration) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::USER_INTEGRATIONS)?;
        let key = tables::owned_key(&integration.user_id, &integration.id);
        let bytes = bincode::serialize(integration)?;
        table.insert(key.as_str(), bytes.as_slice())?;
    }
    write_txn.commit()?;
    Ok(())
}

#[async_trait]
impl IntegrationStore for RedbIntegrationStore {
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let db = self.db.clone();
        let email = email.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<Profile>> {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_table(tables::PROFILE_EMAILS)?;

            let Some(user_id) = index.get(email.as_str())?.map(|h| h.value().to_string()) else {
                return Ok(None);
            };

            let profiles = read_txn.open_table(tables::PROFILES)?;
            let key = tables::owned_key(&user_id, &user_id);
            let profile: Option<Profile> = profiles
                .get(key.as_str())?
                .map(|value| bincode::deserialize(value.value()))
                .transpose()?;

            Ok(profile.filter(|p| p.email == email))
        })
        .await?
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserIntegration>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || current(&db, &user_id)).await?
    }

    async fn store_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<UserIntegration> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.map(str::to_string);

        tokio::task::spawn_blocking(move || -> Result<UserIntegration> {
            let integration = match current(&db, &user_id)? {
                Some(mut existing) => {
                    existing.google_access_token = Some(access_token);
                    // Google may omit the refresh token on re-consent
                    if refresh_token.is_some() {
                        existing.google_refresh_token = refresh_token;
                    }
                    existing.updated_at = Utc::now();
                    existing
                }
                None => UserIntegration {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: user_id.clone(),
                    google_access_token: Some(access_token),
                    google_refresh_token: refresh_token,
                    google_calendar_id: None,
                    updated_at: Utc::now(),
                },
            };

            save(&db, &integration)?;
            Ok(integration)
        })
        .await?
    }

    async fn update_access_token(&self, user_id: &str, access_token: &str) -> Result<()> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let access_token = access_token.to_string();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut integration = current(&db, &user_id)?.ok_or(AppError::IntegrationNotFound)?;
            integration.google_access_token = Some(access_token);
            integration.updated_at = Utc::now();
            save(&db, &integration)
        })
        .await?
    }

    async fn clear_tokens(&self, user_id: &str) -> Result<bool> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            match current(&db, &user_id)? {
                Some(mut integration) => {
                    integration.google_access_token = None;
                    integration.google_refresh_token = None;
                    integration.updated_at = Utc::now();
                    save(&db, &integration)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
        .await?
    }
}
