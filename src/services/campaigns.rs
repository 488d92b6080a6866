use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::{Campaign, CampaignContent};

use super::{ListOptions, Page};

#[derive(Debug, Default)]
pub struct CampaignService;

#[derive(Debug, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub objective: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewCampaignContent {
    pub content_type: String,
    pub content: String,
    pub variant: Option<String>,
}

impl CampaignService {
    pub async fn list(
        &self,
        tenant_id: Uuid,
        opts: &ListOptions,
    ) -> Result<Page<Campaign>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM campaigns WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&pool)
                .await?;

        let items = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT * FROM campaigns
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(opts.limit())
        .bind(opts.offset())
        .fetch_all(&pool)
        .await?;

        Ok(Page {
            items,
            total: total.0,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Campaign>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(campaign)
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        new: NewCampaign,
    ) -> Result<Campaign, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (tenant_id, name, objective, status)
            VALUES ($1, $2, $3, 'draft')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.name)
        .bind(new.objective)
        .fetch_one(&pool)
        .await?;
        Ok(campaign)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_content(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<CampaignContent>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let rows = sqlx::query_as::<_, CampaignContent>(
            r#"
            SELECT * FROM campaign_content
            WHERE campaign_id = $1
            ORDER BY content_type, created_at
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    /// Bulk-insert generated content items for a campaign. A plain multi-row
    /// insert, not a transaction spanning other writes.
    pub async fn add_content(
        &self,
        campaign_id: Uuid,
        items: Vec<NewCampaignContent>,
    ) -> Result<Vec<CampaignContent>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, CampaignContent>(
                r#"
                INSERT INTO campaign_content (campaign_id, content_type, content, variant, approved)
                VALUES ($1, $2, $3, $4, FALSE)
                RETURNING *
                "#,
            )
            .bind(campaign_id)
            .bind(item.content_type)
            .bind(item.content)
            .bind(item.variant)
            .fetch_one(&pool)
            .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    /// Flip the approval flag of one content item belonging to the given
    /// campaign. The campaign predicate is part of the statement itself: a
    /// content id from a different campaign matches nothing and nothing is
    /// written.
    pub async fn set_content_approval(
        &self,
        campaign_id: Uuid,
        content_id: Uuid,
        approved: bool,
    ) -> Result<Option<CampaignContent>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let row = sqlx::query_as::<_, CampaignContent>(APPROVE_CONTENT_SQL)
            .bind(content_id)
            .bind(campaign_id)
            .bind(approved)
            .fetch_optional(&pool)
            .await?;
        Ok(row)
    }
}

const APPROVE_CONTENT_SQL: &str =
    "UPDATE campaign_content SET approved = $3 WHERE id = $1 AND campaign_id = $2 RETURNING *";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_update_is_scoped_to_its_campaign() {
        // The scope must constrain the UPDATE, not a post-read check on the
        // returned row.
        assert!(APPROVE_CONTENT_SQL.contains("WHERE id = $1 AND campaign_id = $2"));
    }
}
