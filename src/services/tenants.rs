use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::tenant::{plan, status, Tenant, TenantMembership};

#[derive(Debug, Default)]
pub struct TenantService;

#[derive(Debug, Default, Deserialize)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub plan: Option<String>,
    pub status: Option<String>,
}

/// Derive a URL-safe slug from an email's local part
fn slug_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let slug: String = local
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "tenant".to_string()
    } else {
        slug
    }
}

impl TenantService {
    /// All memberships for a principal, oldest first. The resolver consults
    /// only the first row.
    pub async fn memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<TenantMembership>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let rows = sqlx::query_as::<_, TenantMembership>(
            "SELECT * FROM tenant_memberships WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(tenant)
    }

    /// Full tenant roster, newest first (internal admin surface)
    pub async fn list_clients(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let rows = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(&pool)
            .await?;
        Ok(rows)
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: TenantUpdate,
    ) -> Result<Option<Tenant>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                plan = COALESCE($3, plan),
                status = COALESCE($4, status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.plan)
        .bind(update.status)
        .fetch_optional(&pool)
        .await?;
        Ok(tenant)
    }

    /// First-sign-in auto-provisioning: create a trial tenant plus an owner
    /// membership for a principal that has none. The slug comes from the
    /// email local part, uniquified on collision.
    pub async fn provision_for_signin(
        &self,
        principal_id: Uuid,
        email: &str,
    ) -> Result<Tenant, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let base_slug = slug_from_email(email);
        let name = base_slug.clone();

        let mut slug = base_slug.clone();
        let tenant = loop {
            let attempt = sqlx::query_as::<_, Tenant>(
                r#"
                INSERT INTO tenants (name, slug, owner_email, plan, status, settings)
                VALUES ($1, $2, $3, $4, $5, '{}'::jsonb)
                RETURNING *
                "#,
            )
            .bind(&name)
            .bind(&slug)
            .bind(email)
            .bind(plan::FREE)
            .bind(status::TRIAL)
            .fetch_one(&pool)
            .await;

            match attempt {
                Ok(tenant) => break tenant,
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    let suffix = &Uuid::new_v4().simple().to_string()[..6];
                    slug = format!("{}-{}", base_slug, suffix);
                }
                Err(err) => return Err(err.into()),
            }
        };

        sqlx::query(
            "INSERT INTO tenant_memberships (tenant_id, user_id, role) VALUES ($1, $2, 'owner')",
        )
        .bind(tenant.id)
        .bind(principal_id)
        .execute(&pool)
        .await?;

        info!("Provisioned tenant {} ({}) for {}", tenant.id, tenant.slug, email);
        Ok(tenant)
    }

    /// Locate a tenant by the payment provider's subscription id stored in
    /// its settings map
    pub async fn find_by_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Tenant>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE settings->>'subscription_id' = $1",
        )
        .bind(subscription_id)
        .fetch_optional(&pool)
        .await?;
        Ok(tenant)
    }

    /// checkout completed: plan premium, provider linkage into settings
    pub async fn activate_premium(
        &self,
        tenant_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let linkage = json!({
            "customer_id": customer_id,
            "subscription_id": subscription_id,
        });
        sqlx::query(
            r#"
            UPDATE tenants SET
                plan = $2,
                status = $3,
                settings = settings || $4::jsonb,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(plan::PREMIUM)
        .bind(status::ACTIVE)
        .bind(linkage)
        .execute(&pool)
        .await?;
        Ok(())
    }

    /// subscription ended: back to free, linkage cleared, cancellation stamped
    pub async fn downgrade_to_free(&self, tenant_id: Uuid) -> Result<(), DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        sqlx::query(
            r#"
            UPDATE tenants SET
                plan = $2,
                settings = settings - 'subscription_id',
                canceled_at = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(plan::FREE)
        .execute(&pool)
        .await?;
        Ok(())
    }

    /// past_due: plan stays, tenant suspended
    pub async fn suspend(&self, tenant_id: Uuid) -> Result<(), DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        sqlx::query("UPDATE tenants SET status = $2, updated_at = now() WHERE id = $1")
            .bind(tenant_id)
            .bind(status::SUSPENDED)
            .execute(&pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_comes_from_email_local_part() {
        assert_eq!(slug_from_email("mario.bianchi@acme.example"), "mario-bianchi");
        assert_eq!(slug_from_email("Sales+Team@acme.example"), "sales-team");
        assert_eq!(slug_from_email("ok@x.example"), "ok");
    }

    #[test]
    fn degenerate_emails_still_produce_a_slug() {
        assert_eq!(slug_from_email("@acme.example"), "tenant");
        assert_eq!(slug_from_email("..."), "tenant");
    }
}
