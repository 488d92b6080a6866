use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::email_thread::{self, EmailThread};

use super::{ListOptions, Page};

/// Outreach briefings: inbound message + AI-drafted reply awaiting review
#[derive(Debug, Default)]
pub struct EmailThreadService;

impl EmailThreadService {
    /// List threads, optionally scoped to a tenant. Internal admins pass
    /// `None` and see the unscoped queue.
    pub async fn list(
        &self,
        tenant_id: Option<Uuid>,
        opts: &ListOptions,
    ) -> Result<Page<EmailThread>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let push_filters = |qb: &mut QueryBuilder<Postgres>| {
            if let Some(tenant_id) = tenant_id {
                qb.push(" AND tenant_id = ").push_bind(tenant_id);
            }
            if let Some(status) = &opts.status {
                qb.push(" AND status = ").push_bind(status.clone());
            }
        };

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM email_threads WHERE TRUE");
        push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM email_threads WHERE TRUE");
        push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(opts.limit())
            .push(" OFFSET ")
            .push_bind(opts.offset());
        let items = qb.build_query_as::<EmailThread>().fetch_all(&pool).await?;

        Ok(Page { items, total })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<EmailThread>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let thread = sqlx::query_as::<_, EmailThread>("SELECT * FROM email_threads WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(thread)
    }

    /// pending_review → sent, stamping sent_at
    pub async fn mark_sent(&self, id: Uuid) -> Result<Option<EmailThread>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let thread = sqlx::query_as::<_, EmailThread>(
            "UPDATE email_threads SET status = $2, sent_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(email_thread::status::SENT)
        .fetch_optional(&pool)
        .await?;
        Ok(thread)
    }

    /// pending_review → dismissed
    pub async fn mark_dismissed(&self, id: Uuid) -> Result<Option<EmailThread>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let thread = sqlx::query_as::<_, EmailThread>(
            "UPDATE email_threads SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(email_thread::status::DISMISSED)
        .fetch_optional(&pool)
        .await?;
        Ok(thread)
    }
}
