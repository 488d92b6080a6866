//! Uniform tenant-ownership authorization, applied by every tenant-scoped
//! handler instead of per-route ad hoc checks.

use uuid::Uuid;

use crate::error::ApiError;
use crate::tenancy::{TenantContext, TenantRole};

/// Require a tenant-scoped principal and return its tenant id.
///
/// Internal admins have no tenant of their own, so endpoints that operate on
/// "my tenant's data" reject them rather than guessing a scope.
pub fn require_tenant(ctx: &TenantContext) -> Result<Uuid, ApiError> {
    if !ctx.role.is_tenant_user() {
        return Err(ApiError::forbidden("A tenant account is required"));
    }
    ctx.tenant_id
        .ok_or_else(|| ApiError::forbidden("No tenant is associated with this account"))
}

/// Assert the resolved context owns a resource.
///
/// Several operations run on an elevated store credential that bypasses
/// row-level isolation, so this check must happen before every mutation.
/// Internal admins are unscoped and pass.
pub fn assert_tenant_owns(ctx: &TenantContext, resource_tenant_id: Uuid) -> Result<(), ApiError> {
    if ctx.role == TenantRole::InternalAdmin {
        return Ok(());
    }
    match ctx.tenant_id {
        Some(tenant_id) if tenant_id == resource_tenant_id => Ok(()),
        _ => Err(ApiError::forbidden(
            "Resource does not belong to your tenant",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: TenantRole, tenant_id: Option<Uuid>) -> TenantContext {
        TenantContext { role, tenant_id }
    }

    #[test]
    fn matching_tenant_passes() {
        let id = Uuid::new_v4();
        let ctx = ctx(TenantRole::TenantOwner, Some(id));
        assert!(assert_tenant_owns(&ctx, id).is_ok());
    }

    #[test]
    fn mismatched_tenant_is_forbidden() {
        let ctx = ctx(TenantRole::TenantMember, Some(Uuid::new_v4()));
        let err = assert_tenant_owns(&ctx, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn internal_admin_is_unscoped() {
        let ctx = ctx(TenantRole::InternalAdmin, None);
        assert!(assert_tenant_owns(&ctx, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn require_tenant_rejects_internal_admin() {
        let ctx = ctx(TenantRole::InternalAdmin, None);
        let err = require_tenant(&ctx).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn require_tenant_returns_the_scope() {
        let id = Uuid::new_v4();
        let ctx = ctx(TenantRole::TenantAdmin, Some(id));
        assert_eq!(require_tenant(&ctx).unwrap(), id);
    }
}
