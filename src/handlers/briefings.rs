//! Review queue for AI-drafted outreach replies. Every send goes through a
//! human approval here; nothing emails a prospect automatically.

use async_trait::async_trait;
use axum::extract::{Path, Query};
use axum::Extension;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::database::models::email_thread::{status, EmailThread};
use crate::error::ApiError;
use crate::integrations::email::{self, EmailError, EmailSender, OutboundEmail};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, ListOptions};
use crate::tenancy::{guard, resolve_tenant_context, TenantContext, TenantRole};

use super::page_json;

/// GET /api/briefings - pending drafts for review. Internal admins
/// see the unscoped queue; tenant users see only their own.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(opts): Query<ListOptions>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let scope = queue_scope(&ctx)?;

    let page = services::email_threads().list(scope, &opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

/// POST /api/briefings/:id/send - approve and send one draft
pub async fn send(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmailThread> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let thread = load_owned_thread(&ctx, id).await?;

    if thread.status != status::PENDING_REVIEW {
        return Err(ApiError::conflict("Thread is not awaiting review"));
    }
    send_thread(email::sender(), &thread)
        .await
        .map_err(ApiError::unprocessable_entity)?;

    let updated = services::email_threads()
        .mark_sent(thread.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/briefings/:id/dismiss - discard one draft
pub async fn dismiss(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmailThread> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let thread = load_owned_thread(&ctx, id).await?;

    let updated = services::email_threads()
        .mark_dismissed(thread.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    Ok(ApiResponse::success(updated))
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BulkSendSummary {
    pub sent: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

/// POST /api/briefings/bulk-send - approve every pending draft in
/// the caller's queue, paging until the queue is drained. Individual failures
/// are collected, never fatal, so one bad draft cannot block the rest.
pub async fn bulk_send(Extension(auth): Extension<AuthUser>) -> ApiResult<BulkSendSummary> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let scope = queue_scope(&ctx)?;

    let summary = drain_pending(&DbQueue { scope }, email::sender()).await?;
    Ok(ApiResponse::success(summary))
}

/// Seam over the pending queue so the drain loop can be tested without a
/// database.
#[async_trait]
trait BriefingQueue: Sync {
    async fn fetch_pending(&self, offset: i64, limit: i64) -> Result<Vec<EmailThread>, ApiError>;
    async fn mark_sent(&self, id: Uuid) -> Result<(), ApiError>;
}

struct DbQueue {
    scope: Option<Uuid>,
}

#[async_trait]
impl BriefingQueue for DbQueue {
    async fn fetch_pending(&self, offset: i64, limit: i64) -> Result<Vec<EmailThread>, ApiError> {
        let opts = ListOptions {
            status: Some(status::PENDING_REVIEW.to_string()),
            limit: Some(limit),
            offset: Some(offset),
            ..Default::default()
        };
        let page = services::email_threads().list(self.scope, &opts).await?;
        Ok(page.items)
    }

    async fn mark_sent(&self, id: Uuid) -> Result<(), ApiError> {
        services::email_threads().mark_sent(id).await?;
        Ok(())
    }
}

/// Page through the pending queue until it is drained. Failed items stay
/// pending, so the fetch offset advances past them to guarantee the loop
/// terminates.
async fn drain_pending(
    queue: &dyn BriefingQueue,
    sender: &dyn EmailSender,
) -> Result<BulkSendSummary, ApiError> {
    let mut summary = BulkSendSummary::default();
    let mut skip = 0i64;
    loop {
        let items = queue.fetch_pending(skip, ListOptions::MAX_LIMIT).await?;
        if items.is_empty() {
            break;
        }
        let fetched = items.len();

        let batch = send_batch(sender, &items).await;
        for id in &batch.sent {
            if let Err(e) = queue.mark_sent(*id).await {
                warn!("Thread {} sent but not marked: {}", id, e);
                skip += 1;
            }
        }
        skip += batch.failed.len() as i64;
        summary.sent.extend(batch.sent);
        summary.failed.extend(batch.failed);

        if fetched < ListOptions::MAX_LIMIT as usize {
            break;
        }
    }
    Ok(summary)
}

/// Attempt every thread in order. A failure is recorded and the batch moves
/// on; item k failing never blocks item k+1.
async fn send_batch(sender: &dyn EmailSender, threads: &[EmailThread]) -> BulkSendSummary {
    let mut summary = BulkSendSummary::default();
    for thread in threads {
        match send_thread(sender, thread).await {
            Ok(()) => summary.sent.push(thread.id),
            Err(reason) => summary.failed.push(BulkFailure {
                id: thread.id,
                reason,
            }),
        }
    }
    summary
}

/// Validate and deliver one drafted reply. Returns the rejection reason as a
/// plain string so bulk callers can collect it per thread.
async fn send_thread(sender: &dyn EmailSender, thread: &EmailThread) -> Result<(), String> {
    let recipient = thread
        .recipient_email
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EmailError::MissingRecipient.to_string())?;
    let body = thread
        .draft_reply
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EmailError::MissingBody.to_string())?;

    let message = OutboundEmail {
        to_email: recipient.to_string(),
        to_name: None,
        subject: thread
            .subject
            .clone()
            .unwrap_or_else(|| "Re: your enquiry".to_string()),
        html_body: body.to_string(),
    };
    sender.send(&message).await.map_err(|e| e.to_string())
}

fn queue_scope(ctx: &TenantContext) -> Result<Option<Uuid>, ApiError> {
    if ctx.role == TenantRole::InternalAdmin {
        Ok(None)
    } else {
        guard::require_tenant(ctx).map(Some)
    }
}

async fn load_owned_thread(ctx: &TenantContext, id: Uuid) -> Result<EmailThread, ApiError> {
    let thread = services::email_threads()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    match thread.tenant_id {
        Some(tenant_id) => guard::assert_tenant_owns(ctx, tenant_id)?,
        // Untenanted legacy rows are internal-only
        None if ctx.role == TenantRole::InternalAdmin => {}
        None => return Err(ApiError::forbidden("Resource does not belong to your tenant")),
    }
    Ok(thread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSender {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for MockSender {
        async fn send(&self, message: &OutboundEmail) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::Provider("boom".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn thread(recipient: Option<&str>, draft: Option<&str>) -> EmailThread {
        EmailThread {
            id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            lead_id: None,
            recipient_email: recipient.map(String::from),
            subject: Some("Quote request".to_string()),
            inbound_message: Some("Hi, can you quote us?".to_string()),
            draft_reply: draft.map(String::from),
            status: status::PENDING_REVIEW.to_string(),
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    #[tokio::test]
    async fn sends_a_complete_draft() {
        let sender = MockSender::default();
        let t = thread(Some("jo@example.com"), Some("<p>Happy to help</p>"));
        send_thread(&sender, &t).await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "jo@example.com");
        assert_eq!(sent[0].subject, "Quote request");
    }

    #[tokio::test]
    async fn missing_recipient_is_rejected_before_sending() {
        let sender = MockSender::default();
        let t = thread(None, Some("body"));
        let reason = send_thread(&sender, &t).await.unwrap_err();
        assert_eq!(reason, "No recipient email");
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_draft_body_is_rejected() {
        let sender = MockSender::default();
        let t = thread(Some("jo@example.com"), None);
        let reason = send_thread(&sender, &t).await.unwrap_err();
        assert_eq!(reason, "No email draft body");
    }

    #[tokio::test]
    async fn blank_draft_body_is_rejected() {
        let sender = MockSender::default();
        let t = thread(Some("jo@example.com"), Some("   "));
        assert!(send_thread(&sender, &t).await.is_err());
    }

    #[tokio::test]
    async fn subject_falls_back_when_absent() {
        let sender = MockSender::default();
        let mut t = thread(Some("jo@example.com"), Some("body"));
        t.subject = None;
        send_thread(&sender, &t).await.unwrap();
        assert_eq!(sender.sent.lock().unwrap()[0].subject, "Re: your enquiry");
    }

    #[tokio::test]
    async fn batch_continues_past_a_bad_item() {
        let sender = MockSender::default();
        let good_one = thread(Some("a@example.com"), Some("body a"));
        let bodyless = thread(Some("b@example.com"), None);
        let good_two = thread(Some("c@example.com"), Some("body c"));
        let threads = vec![good_one.clone(), bodyless.clone(), good_two.clone()];

        let summary = send_batch(&sender, &threads).await;

        assert_eq!(summary.sent, vec![good_one.id, good_two.id]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].id, bodyless.id);
        assert_eq!(summary.failed[0].reason, "No email draft body");
        // Delivery order matches input order
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].to_email, "a@example.com");
        assert_eq!(sent[1].to_email, "c@example.com");
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_reason() {
        let sender = MockSender {
            fail: true,
            ..Default::default()
        };
        let t = thread(Some("jo@example.com"), Some("body"));
        let reason = send_thread(&sender, &t).await.unwrap_err();
        assert!(reason.contains("boom"));
    }

    struct MockQueue {
        pending: Mutex<Vec<EmailThread>>,
    }

    #[async_trait]
    impl BriefingQueue for MockQueue {
        async fn fetch_pending(
            &self,
            offset: i64,
            limit: i64,
        ) -> Result<Vec<EmailThread>, ApiError> {
            let pending = self.pending.lock().unwrap();
            Ok(pending
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn mark_sent(&self, id: Uuid) -> Result<(), ApiError> {
            self.pending.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_processes_more_than_one_page() {
        let sender = MockSender::default();
        let threads: Vec<EmailThread> = (0..150)
            .map(|_| thread(Some("a@example.com"), Some("body")))
            .collect();
        let queue = MockQueue {
            pending: Mutex::new(threads),
        };

        let summary = drain_pending(&queue, &sender).await.unwrap();

        assert_eq!(summary.sent.len(), 150);
        assert!(summary.failed.is_empty());
        assert!(queue.pending.lock().unwrap().is_empty());
        assert_eq!(sender.sent.lock().unwrap().len(), 150);
    }

    #[tokio::test]
    async fn drain_terminates_when_failures_stay_pending() {
        let sender = MockSender::default();
        let mut threads = vec![thread(Some("x@example.com"), None)];
        threads.extend((0..100).map(|_| thread(Some("a@example.com"), Some("body"))));
        let queue = MockQueue {
            pending: Mutex::new(threads),
        };

        let summary = drain_pending(&queue, &sender).await.unwrap();

        assert_eq!(summary.sent.len(), 100);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].reason, "No email draft body");
        // The bodyless thread is still pending, nothing else
        assert_eq!(queue.pending.lock().unwrap().len(), 1);
    }
}
