use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::SeoOverride;

#[derive(Debug, Default)]
pub struct SeoService;

#[derive(Debug, Deserialize)]
pub struct SeoUpsert {
    pub page_path: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

impl SeoService {
    pub async fn list(&self) -> Result<Vec<SeoOverride>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let rows =
            sqlx::query_as::<_, SeoOverride>("SELECT * FROM seo_overrides ORDER BY page_path")
                .fetch_all(&pool)
                .await?;
        Ok(rows)
    }

    pub async fn get_by_path(&self, page_path: &str) -> Result<Option<SeoOverride>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let row = sqlx::query_as::<_, SeoOverride>(
            "SELECT * FROM seo_overrides WHERE page_path = $1",
        )
        .bind(page_path)
        .fetch_optional(&pool)
        .await?;
        Ok(row)
    }

    /// Insert or update the override for a page path
    pub async fn upsert(&self, upsert: SeoUpsert) -> Result<SeoOverride, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let row = sqlx::query_as::<_, SeoOverride>(
            r#"
            INSERT INTO seo_overrides (page_path, title, description, keywords)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (page_path) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                keywords = EXCLUDED.keywords,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(upsert.page_path)
        .bind(upsert.title)
        .bind(upsert.description)
        .bind(upsert.keywords)
        .fetch_one(&pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let result = sqlx::query("DELETE FROM seo_overrides WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
