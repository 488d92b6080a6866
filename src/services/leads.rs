use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::{GeneratedLead, Lead};

use super::{ListOptions, Page};

/// Contact-form leads (internal surface, not tenant-scoped)
#[derive(Debug, Default)]
pub struct LeadService;

#[derive(Debug, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub province: Option<String>,
    pub message: Option<String>,
}

impl LeadService {
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<Lead>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let push_filters = |qb: &mut QueryBuilder<Postgres>| {
            if let Some(source) = &opts.source {
                qb.push(" AND source = ").push_bind(source.clone());
            }
            if let Some(province) = &opts.province {
                qb.push(" AND province = ").push_bind(province.clone());
            }
            if let Some(status) = &opts.status {
                qb.push(" AND status = ").push_bind(status.clone());
            }
            if let Some(search) = &opts.search {
                let term = format!("%{}%", search);
                qb.push(" AND (name ILIKE ")
                    .push_bind(term.clone())
                    .push(" OR email ILIKE ")
                    .push_bind(term.clone())
                    .push(" OR company ILIKE ")
                    .push_bind(term)
                    .push(")");
            }
        };

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM leads WHERE TRUE");
        push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM leads WHERE TRUE");
        push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(opts.limit())
            .push(" OFFSET ")
            .push_bind(opts.offset());
        let items = qb.build_query_as::<Lead>().fetch_all(&pool).await?;

        Ok(Page { items, total })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Lead>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(lead)
    }

    pub async fn create(&self, new: NewLead) -> Result<Lead, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, email, phone, company, source, province, status, message)
            VALUES ($1, $2, $3, $4, $5, $6, 'new', $7)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.company)
        .bind(new.source)
        .bind(new.province)
        .bind(new.message)
        .fetch_one(&pool)
        .await?;
        Ok(lead)
    }
}

/// Tenant-scoped generated prospect lists
#[derive(Debug, Default)]
pub struct GeneratedLeadService;

impl GeneratedLeadService {
    /// List a tenant's generated leads; filters and pagination per ListOptions
    pub async fn list(
        &self,
        tenant_id: Uuid,
        opts: &ListOptions,
    ) -> Result<Page<GeneratedLead>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let push_filters = |qb: &mut QueryBuilder<Postgres>| {
            qb.push(" AND tenant_id = ").push_bind(tenant_id);
            if let Some(province) = &opts.province {
                qb.push(" AND province = ").push_bind(province.clone());
            }
            if let Some(status) = &opts.status {
                qb.push(" AND status = ").push_bind(status.clone());
            }
            if let Some(search) = &opts.search {
                let term = format!("%{}%", search);
                qb.push(" AND (company_name ILIKE ")
                    .push_bind(term.clone())
                    .push(" OR contact_name ILIKE ")
                    .push_bind(term.clone())
                    .push(" OR industry ILIKE ")
                    .push_bind(term)
                    .push(")");
            }
        };

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM generated_leads WHERE TRUE");
        push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM generated_leads WHERE TRUE");
        push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(opts.limit())
            .push(" OFFSET ")
            .push_bind(opts.offset());
        let items = qb.build_query_as::<GeneratedLead>().fetch_all(&pool).await?;

        Ok(Page { items, total })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<GeneratedLead>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let lead = sqlx::query_as::<_, GeneratedLead>("SELECT * FROM generated_leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(lead)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Option<GeneratedLead>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let lead = sqlx::query_as::<_, GeneratedLead>(
            r#"
            UPDATE generated_leads
            SET status = $2, notes = COALESCE($3, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&pool)
        .await?;
        Ok(lead)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let result = sqlx::query("DELETE FROM generated_leads WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Generated-lead count for the current calendar month (plan-limit input)
    pub async fn count_monthly(&self, tenant_id: Uuid) -> Result<i64, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM generated_leads
            WHERE tenant_id = $1 AND created_at >= date_trunc('month', now())
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&pool)
        .await?;
        Ok(count.0)
    }
}
