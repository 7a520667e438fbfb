use sqlx::FromRow;

use super::Store;
use crate::errors::AppError;
use crate::models::{ConfigUpdate, StoredConfig, UserProfile};

#[derive(FromRow)]
struct ConfigRow {
    api_key: Option<String>,
    user_info: Option<String>,
    model_name: Option<String>,
}

impl Store {
    /// Reads the configuration record. A missing row or column reads as empty.
    pub async fn get_config(&self) -> Result<StoredConfig, AppError> {
        let row: Option<ConfigRow> =
            sqlx::query_as("SELECT api_key, user_info, model_name FROM configs WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(StoredConfig::default());
        };

        let profile = match row.user_info.as_deref() {
            Some(json) if !json.trim().is_empty() => serde_json::from_str::<UserProfile>(json)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored profile is corrupt: {e}")))?,
            _ => UserProfile::default(),
        };

        Ok(StoredConfig {
            api_key: row.api_key.unwrap_or_default(),
            model_name: row.model_name.unwrap_or_default(),
            profile,
        })
    }

    /// Single-statement upsert. Fields left `None` keep their stored value.
    pub async fn save_config(&self, update: ConfigUpdate) -> Result<(), AppError> {
        let user_info = update
            .profile
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO configs (id, api_key, user_info, model_name)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                api_key = COALESCE(excluded.api_key, configs.api_key),
                user_info = COALESCE(excluded.user_info, configs.user_info),
                model_name = COALESCE(excluded.model_name, configs.model_name)
            "#,
        )
        .bind(update.api_key)
        .bind(user_info)
        .bind(update.model_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_profile_snapshot(&self, profile: UserProfile) -> Result<(), AppError> {
        self.save_config(ConfigUpdate {
            profile: Some(profile),
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_reads_defaults() {
        let store = Store::in_memory().await;
        let config = store.get_config().await.unwrap();
        assert_eq!(config.api_key, "");
        assert_eq!(config.model_name, "");
        assert_eq!(config.profile, UserProfile::default());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = Store::in_memory().await;
        store
            .save_config(ConfigUpdate {
                api_key: Some("key-1".into()),
                model_name: Some("gemini-1.5-pro".into()),
                profile: None,
            })
            .await
            .unwrap();
        store
            .save_profile_snapshot(UserProfile {
                name: "Jane Doe".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .save_config(ConfigUpdate {
                api_key: Some("key-2".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let config = store.get_config().await.unwrap();
        assert_eq!(config.api_key, "key-2");
        assert_eq!(config.model_name, "gemini-1.5-pro");
        assert_eq!(config.profile.name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_empty_string_clears_key() {
        let store = Store::in_memory().await;
        store
            .save_config(ConfigUpdate {
                api_key: Some("key-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .save_config(ConfigUpdate {
                api_key: Some(String::new()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!store.get_config().await.unwrap().has_api_key());
    }
}
