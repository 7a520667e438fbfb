use chrono::Utc;

use super::Store;
use crate::errors::AppError;
use crate::models::ResumeRecord;

impl Store {
    pub async fn add_resume(
        &self,
        filename: &str,
        mime: &str,
        content: &str,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO resumes (filename, mime, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(filename)
        .bind(mime)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_resume(&self, id: i64) -> Result<ResumeRecord, AppError> {
        sqlx::query_as::<_, ResumeRecord>(
            "SELECT id, filename, mime, content, created_at FROM resumes WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
    }

    pub async fn get_latest_resume(&self) -> Result<Option<ResumeRecord>, AppError> {
        let row = sqlx::query_as::<_, ResumeRecord>(
            "SELECT id, filename, mime, content, created_at FROM resumes ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_resumes(&self, limit: i64) -> Result<Vec<ResumeRecord>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRecord>(
            "SELECT id, filename, mime, content, created_at FROM resumes ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
