use chrono::Utc;

use super::Store;
use crate::errors::AppError;
use crate::models::{ContentKind, GenerationRecord};

const GENERATION_COLUMNS: &str =
    "id, type, job_description, output, resume_id, profile_id, created_at";

impl Store {
    /// Appends a history record and returns its id.
    pub async fn add_generation(
        &self,
        kind: ContentKind,
        job_description: &str,
        output: &str,
        resume_id: Option<i64>,
        profile_id: Option<i64>,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO generations (type, job_description, output, resume_id, profile_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(kind.as_str())
        .bind(job_description)
        .bind(output)
        .bind(resume_id)
        .bind(profile_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest first. Ties on the timestamp fall back to insertion order.
    pub async fn list_generations(&self, limit: i64) -> Result<Vec<GenerationRecord>, AppError> {
        let rows = sqlx::query_as::<_, GenerationRecord>(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_generation(&self, id: i64) -> Result<GenerationRecord, AppError> {
        sqlx::query_as::<_, GenerationRecord>(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Generation {id} not found")))
    }

    /// Replaces the output text of a record, e.g. after a manual edit.
    pub async fn update_generation(&self, id: i64, output: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE generations SET output = ?1 WHERE id = ?2")
            .bind(output)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Generation {id} not found")));
        }
        Ok(())
    }

    pub async fn delete_generation(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM generations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Generation {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_auto_increment_and_list_is_newest_first() {
        let store = Store::in_memory().await;
        let first = store
            .add_generation(ContentKind::Resume, "JD one", "# Resume", None, None)
            .await
            .unwrap();
        let second = store
            .add_generation(ContentKind::CoverLetter, "JD two", "Dear team", None, None)
            .await
            .unwrap();
        assert!(second > first);

        let history = store.list_generations(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second);
        assert_eq!(history[0].kind, ContentKind::CoverLetter);
        assert_eq!(history[1].job_description, "JD one");
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let store = Store::in_memory().await;
        for i in 0..5 {
            store
                .add_generation(ContentKind::Resume, &format!("JD {i}"), "out", None, None)
                .await
                .unwrap();
        }
        assert_eq!(store.list_generations(3).await.unwrap().len(), 3);
        assert!(store.list_generations(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = Store::in_memory().await;
        let id = store
            .add_generation(ContentKind::Resume, "JD", "draft", None, None)
            .await
            .unwrap();

        store.update_generation(id, "edited").await.unwrap();
        assert_eq!(store.get_generation(id).await.unwrap().output, "edited");

        store.delete_generation(id).await.unwrap();
        assert!(matches!(
            store.get_generation(id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_generation(id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.update_generation(id, "x").await,
            Err(AppError::NotFound(_))
        ));
    }
}
