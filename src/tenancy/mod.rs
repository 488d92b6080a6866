pub mod guard;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::TenantMembership;
use crate::services;

/// Effective role of a principal for this request.
///
/// `InternalAdmin` is the fallback for any authenticated principal without a
/// tenant membership; it carries unscoped access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRole {
    InternalAdmin,
    TenantOwner,
    TenantAdmin,
    TenantMember,
    TenantViewer,
}

impl TenantRole {
    /// Map a stored membership role to an effective role.
    /// Unrecognized stored values degrade to TenantMember.
    pub fn from_stored(role: &str) -> Self {
        match role {
            "owner" => TenantRole::TenantOwner,
            "admin" => TenantRole::TenantAdmin,
            "member" => TenantRole::TenantMember,
            "viewer" => TenantRole::TenantViewer,
            _ => TenantRole::TenantMember,
        }
    }

    /// True for every role except InternalAdmin; the authorization gate for
    /// tenant-scoped resources.
    pub fn is_tenant_user(&self) -> bool {
        !matches!(self, TenantRole::InternalAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TenantRole::InternalAdmin => "internal_admin",
            TenantRole::TenantOwner => "tenant_owner",
            TenantRole::TenantAdmin => "tenant_admin",
            TenantRole::TenantMember => "tenant_member",
            TenantRole::TenantViewer => "tenant_viewer",
        }
    }
}

/// Resolved request context: effective role plus the tenant it is scoped to
/// (None for internal admins).
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub role: TenantRole,
    pub tenant_id: Option<Uuid>,
}

/// Resolve the tenant context for a principal.
///
/// Policy (deliberate, see DESIGN.md): a membership-lookup *error* fails open
/// to InternalAdmin so that infra hiccups never lock out internal operators.
/// "No memberships" is not an error; it is the internal-admin case by
/// definition. With one or more memberships, only the first is consulted.
pub async fn resolve_tenant_context(principal_id: Uuid) -> TenantContext {
    let lookup = services::tenants().memberships_for_user(principal_id).await;

    let (role, tenant_id) = resolve_role(&lookup);
    if role == TenantRole::InternalAdmin {
        if let Err(err) = &lookup {
            warn!(
                "Tenant membership lookup failed for {}; failing open to internal_admin: {}",
                principal_id, err
            );
        }
    }

    TenantContext { role, tenant_id }
}

/// Pure role-resolution core, kept separate so the mapping and the fail-open
/// policy can be pinned by unit tests without a database.
fn resolve_role(
    lookup: &Result<Vec<TenantMembership>, DatabaseError>,
) -> (TenantRole, Option<Uuid>) {
    match lookup {
        Ok(memberships) => match memberships.first() {
            Some(first) => (TenantRole::from_stored(&first.role), Some(first.tenant_id)),
            None => (TenantRole::InternalAdmin, None),
        },
        Err(_) => (TenantRole::InternalAdmin, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn membership(role: &str, tenant_id: Uuid) -> TenantMembership {
        TenantMembership {
            id: Uuid::new_v4(),
            tenant_id,
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn zero_memberships_resolve_to_internal_admin() {
        let (role, tenant_id) = resolve_role(&Ok(vec![]));
        assert_eq!(role, TenantRole::InternalAdmin);
        assert!(tenant_id.is_none());
        assert!(!role.is_tenant_user());
    }

    #[test]
    fn first_membership_wins() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let lookup = Ok(vec![membership("viewer", first), membership("owner", second)]);
        let (role, tenant_id) = resolve_role(&lookup);
        assert_eq!(role, TenantRole::TenantViewer);
        assert_eq!(tenant_id, Some(first));
    }

    #[test]
    fn stored_roles_map_through_fixed_table() {
        assert_eq!(TenantRole::from_stored("owner"), TenantRole::TenantOwner);
        assert_eq!(TenantRole::from_stored("admin"), TenantRole::TenantAdmin);
        assert_eq!(TenantRole::from_stored("member"), TenantRole::TenantMember);
        assert_eq!(TenantRole::from_stored("viewer"), TenantRole::TenantViewer);
        // Unrecognized stored roles degrade to member, never to admin
        assert_eq!(TenantRole::from_stored("superuser"), TenantRole::TenantMember);
        assert_eq!(TenantRole::from_stored(""), TenantRole::TenantMember);
    }

    #[test]
    fn lookup_error_fails_open() {
        // Pinned policy: an error resolving memberships grants internal_admin,
        // not a denial. See DESIGN.md before changing this.
        let lookup = Err(DatabaseError::NotFound("memberships table missing".into()));
        let (role, tenant_id) = resolve_role(&lookup);
        assert_eq!(role, TenantRole::InternalAdmin);
        assert!(tenant_id.is_none());
    }

    #[test]
    fn every_tenant_role_is_a_tenant_user() {
        for role in [
            TenantRole::TenantOwner,
            TenantRole::TenantAdmin,
            TenantRole::TenantMember,
            TenantRole::TenantViewer,
        ] {
            assert!(role.is_tenant_user());
        }
    }
}
