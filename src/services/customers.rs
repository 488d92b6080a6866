use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::{Customer, Lead};

use super::{ListOptions, Page};

#[derive(Debug, Default)]
pub struct CustomerService;

#[derive(Debug, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Caller-supplied overrides for lead promotion; every field wins over the
/// corresponding lead field when present.
#[derive(Debug, Default, Deserialize)]
pub struct PromoteOverrides {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Merge a lead with promotion overrides into an insertable customer payload.
/// Promotion copies; the lead row is never touched.
fn customer_from_lead(lead: &Lead, overrides: PromoteOverrides) -> NewCustomer {
    NewCustomer {
        name: overrides.name.unwrap_or_else(|| lead.name.clone()),
        email: overrides.email.or_else(|| lead.email.clone()),
        phone: overrides.phone.or_else(|| lead.phone.clone()),
        company: overrides.company.or_else(|| lead.company.clone()),
        province: overrides.province.or_else(|| lead.province.clone()),
        status: overrides.status,
        notes: overrides.notes,
    }
}

impl CustomerService {
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<Customer>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let push_filters = |qb: &mut QueryBuilder<Postgres>| {
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
            QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE TRUE");
        push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM customers WHERE TRUE");
        push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(opts.limit())
            .push(" OFFSET ")
            .push_bind(opts.offset());
        let items = qb.build_query_as::<Customer>().fetch_all(&pool).await?;

        Ok(Page { items, total })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(customer)
    }

    pub async fn create(&self, new: NewCustomer) -> Result<Customer, DatabaseError> {
        self.insert(new, None).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                company = COALESCE($5, company),
                province = COALESCE($6, province),
                status = COALESCE($7, status),
                notes = COALESCE($8, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.email)
        .bind(update.phone)
        .bind(update.company)
        .bind(update.province)
        .bind(update.status)
        .bind(update.notes)
        .fetch_optional(&pool)
        .await?;
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Promote a lead into a customer by copying its fields, with caller
    /// overrides winning. The source lead is never mutated or deleted, so
    /// promoting the same lead twice yields two independent customers.
    pub async fn promote_from_lead(
        &self,
        lead_id: Uuid,
        overrides: PromoteOverrides,
    ) -> Result<Customer, DatabaseError> {
        let lead = super::leads()
            .get_by_id(lead_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Lead {} not found", lead_id)))?;

        let payload = customer_from_lead(&lead, overrides);
        self.insert(payload, Some(lead_id)).await
    }

    async fn insert(
        &self,
        new: NewCustomer,
        source_lead_id: Option<Uuid>,
    ) -> Result<Customer, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, company, province, status, notes, source_lead_id)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'prospect'), $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.company)
        .bind(new.province)
        .bind(new.status)
        .bind(new.notes)
        .bind(source_lead_id)
        .fetch_one(&pool)
        .await?;
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Giulia Rossi".to_string(),
            email: Some("giulia@rossi.example".to_string()),
            phone: Some("+39 02 1234567".to_string()),
            company: Some("Rossi Srl".to_string()),
            source: Some("contact_form".to_string()),
            province: Some("MI".to_string()),
            status: "new".to_string(),
            message: Some("Interested in the premium plan".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn promotion_copies_lead_fields() {
        let lead = sample_lead();
        let payload = customer_from_lead(&lead, PromoteOverrides::default());
        assert_eq!(payload.name, "Giulia Rossi");
        assert_eq!(payload.email.as_deref(), Some("giulia@rossi.example"));
        assert_eq!(payload.company.as_deref(), Some("Rossi Srl"));
        // Status defaults at insert time ('prospect') unless overridden
        assert!(payload.status.is_none());
    }

    #[test]
    fn overrides_win_over_lead_fields() {
        let lead = sample_lead();
        let overrides = PromoteOverrides {
            name: Some("Giulia R.".to_string()),
            email: Some("g.rossi@newco.example".to_string()),
            status: Some("active".to_string()),
            ..Default::default()
        };
        let payload = customer_from_lead(&lead, overrides);
        assert_eq!(payload.name, "Giulia R.");
        assert_eq!(payload.email.as_deref(), Some("g.rossi@newco.example"));
        assert_eq!(payload.status.as_deref(), Some("active"));
        // Untouched fields still come from the lead
        assert_eq!(payload.phone.as_deref(), Some("+39 02 1234567"));
    }
}
