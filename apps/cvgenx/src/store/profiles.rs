use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Store;
use crate::errors::AppError;
use crate::models::{ProfileRecord, UserProfile};

const UNTITLED_PROFILE: &str = "Untitled profile";

#[derive(FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    data: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let data = if row.data.trim().is_empty() {
            UserProfile::default()
        } else {
            serde_json::from_str(&row.data).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Profile {} is corrupt: {e}", row.id))
            })?
        };
        Ok(ProfileRecord {
            id: row.id,
            name: row.name,
            data,
            created_at: row.created_at,
        })
    }
}

fn profile_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() {
        UNTITLED_PROFILE
    } else {
        name
    }
}

fn to_json(profile: &UserProfile) -> Result<String, AppError> {
    serde_json::to_string(profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}")))
}

impl Store {
    pub async fn add_profile(&self, name: &str, data: &UserProfile) -> Result<i64, AppError> {
        let result =
            sqlx::query("INSERT INTO profiles (name, data, created_at) VALUES (?1, ?2, ?3)")
                .bind(profile_name(name))
                .bind(to_json(data)?)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, data, created_at FROM profiles ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ProfileRecord::try_from).collect()
    }

    pub async fn get_profile(&self, id: i64) -> Result<ProfileRecord, AppError> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, data, created_at FROM profiles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))?
        .try_into()
    }

    pub async fn update_profile(
        &self,
        id: i64,
        name: &str,
        data: &UserProfile,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE profiles SET name = ?1, data = ?2 WHERE id = ?3")
            .bind(profile_name(name))
            .bind(to_json(data)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {id} not found")));
        }
        Ok(())
    }

    /// Deletes a profile. History records keep their text but lose the link.
    pub async fn delete_profile(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE generations SET profile_id = NULL WHERE profile_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {id} not found")));
        }
        tx.commit().await?;
        Ok(())
    }
}
