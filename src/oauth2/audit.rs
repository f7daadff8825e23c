//! Fire-and-forget audit logging for the authorization endpoint, grounded
//! on `repositories::oauth_audit_log::OAuthAuditLogRepository`. A failure
//! to log must never fail the primary operation: the audit event need not
//! be persisted before the redirect is sent.

use uuid::Uuid;

use crate::models::OAuthEventType;
use crate::repositories::OAuthAuditLogRepository;

pub async fn log_authorize_application(
    audit_repo: &OAuthAuditLogRepository,
    client_id: Uuid,
    user_id: Uuid,
    scopes: &[String],
) {
    audit_repo
        .create(
            OAuthEventType::AuthorizeApplication,
            Some(client_id),
            Some(user_id),
            None,
            Some(serde_json::json!({ "scopes": scopes.join(" ") })),
        )
        .await
        .ok();
}
