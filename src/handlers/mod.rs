pub mod auth_callback;
pub mod billing;
pub mod blog;
pub mod briefings;
pub mod campaigns;
pub mod clients;
pub mod customers;
pub mod graph;
pub mod leads;
pub mod marketing_leads;
pub mod research;
pub mod seo;

use serde::Serialize;
use serde_json::{json, Value};

use crate::services::Page;

/// Standard list envelope: items + total + totalPages for the given limit
pub(crate) fn page_json<T: Serialize>(page: Page<T>, limit: i64) -> Value {
    let total_pages = page.total_pages(limit);
    json!({
        "items": page.items,
        "total": page.total,
        "totalPages": total_pages,
    })
}
