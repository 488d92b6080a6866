pub mod campaign;
pub mod contact;
pub mod content;
pub mod email_thread;
pub mod tenant;

pub use campaign::{Campaign, CampaignContent};
pub use contact::{Customer, GeneratedLead, Lead};
pub use content::{BlogPost, SeoOverride};
pub use email_thread::EmailThread;
pub use tenant::{Tenant, TenantMembership};
