//! Narrow trait boundary standing in for the out-of-scope interactive flow
//! executor, session store, and policy evaluation. A production deployment
//! backs these with real session/policy subsystems; this crate only needs
//! the shape of the collaboration so the authorization-endpoint state
//! machine can be exercised and tested.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A login event: the fact (and time) of the user's most recent
/// authentication, as tracked by the out-of-scope session store.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub login_uid: String,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

/// Session state the authorization endpoint reads/writes directly: the
/// current login event, and the `last_login_uid` key used to detect
/// whether a `prompt=login` re-authentication has completed.
pub trait SessionState: Send + Sync {
    fn login_event(&self) -> Option<LoginEvent>;
    fn last_login_uid(&self) -> Option<String>;
    fn set_last_login_uid(&mut self, uid: String);
    fn is_authenticated(&self) -> bool {
        self.login_event().is_some()
    }
}

/// In-memory session fake used by tests and by any deployment that hasn't
/// wired in a real session backend yet.
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    pub login_event: Option<LoginEvent>,
    pub last_login_uid: Option<String>,
}

impl SessionState for InMemorySession {
    fn login_event(&self) -> Option<LoginEvent> {
        self.login_event.clone()
    }

    fn last_login_uid(&self) -> Option<String> {
        self.last_login_uid.clone()
    }

    fn set_last_login_uid(&mut self, uid: String) {
        self.last_login_uid = Some(uid);
    }
}

/// Outcome of attempting to start (or resume) the interactive flow plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Policy access denied, or the flow is not applicable to this user —
    /// rendered as "no permission", not an OAuth error.
    NoPermission,
    /// Re-authentication is required (max_age exceeded, or prompt=login
    /// not yet satisfied); the caller redirects back into the login flow.
    ReauthRequired,
    /// The plan reached its terminal stage: fulfillment may proceed
    /// immediately (this crate runs fulfillment inline rather than handing
    /// off to a separate executor process).
    ReadyForFulfillment,
}

/// Stands in for the policy-access check plus flow planner that decide
/// whether an authenticated session may proceed straight to fulfillment.
pub trait FlowPlanner: Send + Sync {
    fn plan(&self, session: &dyn SessionState, max_age: Option<i64>, prompt_login: bool) -> PlanOutcome;
}

/// A permissive planner: grants access whenever the session reports an
/// active login (optionally honoring `max_age`/`prompt=login`). Good
/// enough as the default collaborator and for tests; real deployments
/// inject their own policy engine.
pub struct DefaultFlowPlanner;

impl FlowPlanner for DefaultFlowPlanner {
    fn plan(&self, session: &dyn SessionState, max_age: Option<i64>, prompt_login: bool) -> PlanOutcome {
        let Some(login_event) = session.login_event() else {
            return PlanOutcome::NoPermission;
        };

        if let Some(max_age) = max_age {
            let age = (Utc::now() - login_event.created).num_seconds();
            if age > max_age {
                return PlanOutcome::ReauthRequired;
            }
        }

        if prompt_login {
            let login_uid = &login_event.login_uid;
            let satisfied = session
                .last_login_uid()
                .map(|saved| &saved != login_uid)
                .unwrap_or(false);
            if !satisfied {
                return PlanOutcome::ReauthRequired;
            }
        }

        PlanOutcome::ReadyForFulfillment
    }
}

/// Stands in for the consent stage: whether the plan has (or needs) a
/// consent stage, and whether consent has already been recorded for this
/// user/client/scope combination.
/// Async because the real implementation (`services::consent::ConsentService`)
/// performs database lookups.
#[async_trait::async_trait]
pub trait ConsentGate: Send + Sync {
    async fn has_consent(&self, user_id: Uuid, client_id: Uuid, scopes: &[String]) -> bool;
}

pub struct AlwaysConsented;

#[async_trait::async_trait]
impl ConsentGate for AlwaysConsented {
    async fn has_consent(&self, _user_id: Uuid, _client_id: Uuid, _scopes: &[String]) -> bool {
        true
    }
}

#[async_trait::async_trait]
impl ConsentGate for crate::services::ConsentService {
    async fn has_consent(&self, user_id: Uuid, client_id: Uuid, scopes: &[String]) -> bool {
        crate::services::ConsentService::has_consent(self, user_id, client_id, scopes)
            .await
            .unwrap_or(false)
    }
}
