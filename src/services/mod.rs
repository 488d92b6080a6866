//! Per-entity data-access facade over the relational store.
//!
//! Each service is a stateless handle reached through a lazy singleton
//! accessor; constructing one never touches credentials, and every method
//! acquires the shared pool at call time. Methods are single-purpose queries
//! or mutations: no retries, no batching beyond bulk insert, no caching.

mod blog;
mod campaigns;
mod customers;
mod email_threads;
mod leads;
mod seo;
mod tenants;

pub use blog::{BlogPostUpdate, BlogService, NewBlogPost};
pub use campaigns::{CampaignService, NewCampaign, NewCampaignContent};
pub use customers::{CustomerService, CustomerUpdate, NewCustomer, PromoteOverrides};
pub use email_threads::EmailThreadService;
pub use leads::{GeneratedLeadService, LeadService, NewLead};
pub use seo::{SeoService, SeoUpsert};
pub use tenants::{TenantService, TenantUpdate};

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub fn blog() -> &'static BlogService {
    static INSTANCE: OnceLock<BlogService> = OnceLock::new();
    INSTANCE.get_or_init(BlogService::default)
}

pub fn campaigns() -> &'static CampaignService {
    static INSTANCE: OnceLock<CampaignService> = OnceLock::new();
    INSTANCE.get_or_init(CampaignService::default)
}

pub fn customers() -> &'static CustomerService {
    static INSTANCE: OnceLock<CustomerService> = OnceLock::new();
    INSTANCE.get_or_init(CustomerService::default)
}

pub fn email_threads() -> &'static EmailThreadService {
    static INSTANCE: OnceLock<EmailThreadService> = OnceLock::new();
    INSTANCE.get_or_init(EmailThreadService::default)
}

pub fn leads() -> &'static LeadService {
    static INSTANCE: OnceLock<LeadService> = OnceLock::new();
    INSTANCE.get_or_init(LeadService::default)
}

pub fn generated_leads() -> &'static GeneratedLeadService {
    static INSTANCE: OnceLock<GeneratedLeadService> = OnceLock::new();
    INSTANCE.get_or_init(GeneratedLeadService::default)
}

pub fn seo() -> &'static SeoService {
    static INSTANCE: OnceLock<SeoService> = OnceLock::new();
    INSTANCE.get_or_init(SeoService::default)
}

pub fn tenants() -> &'static TenantService {
    static INSTANCE: OnceLock<TenantService> = OnceLock::new();
    INSTANCE.get_or_init(TenantService::default)
}

/// Enumerated list filters shared by the list endpoints. All optional;
/// unknown query parameters are ignored by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOptions {
    pub source: Option<String>,
    pub search: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListOptions {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// One page of a list result. An offset past the end yields empty `items`,
/// never an error.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self, limit: i64) -> i64 {
        total_pages(self.total, limit)
    }
}

/// ceil(total / limit); zero or negative limits yield zero pages
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(100, 20), 5);
        assert_eq!(total_pages(101, 20), 6);
    }

    #[test]
    fn degenerate_limits_yield_zero_pages() {
        assert_eq!(total_pages(50, 0), 0);
        assert_eq!(total_pages(50, -1), 0);
    }

    #[test]
    fn list_options_clamp_limit_and_offset() {
        let opts = ListOptions {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(opts.limit(), ListOptions::MAX_LIMIT);
        assert_eq!(opts.offset(), 0);

        let defaults = ListOptions::default();
        assert_eq!(defaults.limit(), ListOptions::DEFAULT_LIMIT);
        assert_eq!(defaults.offset(), 0);
    }
}
