//! Bridges the request's bearer JWT, the only authentication this
//! deployment has, onto the `SessionState` seam the authorization endpoint
//! depends on. There is no server-side session store here: a missing or
//! unverifiable `Authorization` header is simply "not logged in", never a
//! rejection, unlike `middleware::jwt_auth_middleware`.

use axum::http::HeaderMap;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::utils::jwt::{Claims, JwtManager};

use super::flow::{LoginEvent, SessionState};

/// `last_login_uid` has nowhere durable to live between requests (no
/// session store), so it is round-tripped through this cookie instead.
pub const LAST_LOGIN_UID_COOKIE: &str = "oauth_last_login_uid";

pub struct ClaimsSession {
    claims: Option<Claims>,
    last_login_uid: Option<String>,
}

impl ClaimsSession {
    pub fn from_request(jwt_manager: &JwtManager, headers: &HeaderMap, last_login_uid: Option<String>) -> Self {
        let claims = extract_bearer(headers).and_then(|token| jwt_manager.verify_token(token).ok());
        Self { claims, last_login_uid }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.claims.as_ref().and_then(|c| c.user_id().ok())
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl SessionState for ClaimsSession {
    fn login_event(&self) -> Option<LoginEvent> {
        let claims = self.claims.as_ref()?;
        let user_id = claims.user_id().ok()?;
        Some(LoginEvent {
            login_uid: format!("{}:{}", claims.sub, claims.iat),
            user_id,
            created: Utc.timestamp_opt(claims.iat, 0).single()?,
        })
    }

    fn last_login_uid(&self) -> Option<String> {
        self.last_login_uid.clone()
    }

    fn set_last_login_uid(&mut self, uid: String) {
        self.last_login_uid = Some(uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_unauthenticated_not_rejected() {
        let headers = HeaderMap::new();
        let session = ClaimsSession {
            claims: None,
            last_login_uid: None,
        };
        let _ = headers;
        assert!(!session.is_authenticated());
        assert!(session.login_event().is_none());
    }
}
