use axum::response::{Html, IntoResponse, Response};
use axum::http::StatusCode;

use super::model::ResponseMode;

/// Base / internal fallback error. Any caller that can't produce a more
/// specific variant falls back to this; it always renders as `server_error`
/// to the RP.
#[derive(Debug, Clone, Default, thiserror::Error)]
#[error("internal OAuth2 error")]
pub struct OAuth2Error;

/// Unknown `client_id`. Discovered before any redirect_uri can be trusted,
/// so it always renders as a bad-request page, never a redirect.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown client_id {client_id}")]
pub struct ClientIdError {
    pub client_id: String,
}

impl ClientIdError {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

/// Missing, non-matching, or forbidden-scheme redirect_uri. Carries a
/// `cause` used only for logs/telemetry, never shown to the RP.
#[derive(Debug, Clone, thiserror::Error)]
#[error("redirect_uri {redirect_uri:?} rejected: {cause}")]
pub struct RedirectUriError {
    pub redirect_uri: String,
    pub allowed: Vec<String>,
    pub cause: &'static str,
}

impl RedirectUriError {
    pub fn new(redirect_uri: impl Into<String>, allowed: Vec<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            allowed,
            cause: "redirect_uri_rejected",
        }
    }

    pub fn with_cause(mut self, cause: &'static str) -> Self {
        self.cause = cause;
        self
    }
}

/// All RP-visible OAuth errors: carries everything needed to build an
/// OAuth-formatted redirect back to the RP.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error_code}: {description:?}")]
pub struct AuthorizeError {
    pub redirect_uri: String,
    pub error_code: &'static str,
    pub grant_type: String,
    pub state: String,
    pub description: Option<String>,
    pub cause: Option<&'static str>,
    /// Set once the request's response_mode is known, so the top-level
    /// `IntoResponse` impl can redirect instead of falling back to a
    /// bad-request page.
    pub response_mode: Option<ResponseMode>,
}

impl AuthorizeError {
    pub fn new(
        redirect_uri: impl Into<String>,
        error_code: &'static str,
        grant_type: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            error_code,
            grant_type: grant_type.into(),
            state: state.into(),
            description: None,
            cause: None,
            response_mode: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cause(mut self, cause: &'static str) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = Some(mode);
        self
    }

    fn description_or_default(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.error_code.replace('_', " "))
    }

    /// Redirects to `redirect_uri` with `error`, `error_description`,
    /// `state` placed per the effective response_mode.
    pub fn into_redirect(self, response_mode: ResponseMode) -> Response {
        super::response::build_error_redirect(
            &self.redirect_uri,
            response_mode,
            self.error_code,
            &self.description_or_default(),
            &self.state,
        )
    }
}

/// Top-level error surface for the authorization endpoint: the tagged sum
/// over `{ClientIdError, RedirectUriError, AuthorizeError, Internal}`.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeStageError {
    #[error(transparent)]
    ClientId(#[from] ClientIdError),
    #[error(transparent)]
    RedirectUri(#[from] RedirectUriError),
    #[error(transparent)]
    Authorize(#[from] AuthorizeError),
    #[error(transparent)]
    Internal(#[from] OAuth2Error),
}

/// Renders the HTTP 400 bad-request page used whenever no trusted
/// redirect_uri is known. Never redirects.
pub fn bad_request_page(error: &str, description: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head><body><h1>{title}</h1><p>{desc}</p></body></html>",
        title = html_escape(error),
        desc = html_escape(description),
    );
    (StatusCode::BAD_REQUEST, Html(body)).into_response()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl IntoResponse for AuthorizeStageError {
    fn into_response(self) -> Response {
        match self {
            AuthorizeStageError::ClientId(_) => StatusCode::NOT_FOUND.into_response(),
            AuthorizeStageError::RedirectUri(e) => bad_request_page(
                "invalid_request",
                &format!("redirect_uri could not be validated ({})", e.cause),
            ),
            AuthorizeStageError::Authorize(e) => match e.response_mode {
                Some(mode) => e.into_redirect(mode),
                None => bad_request_page(e.error_code, &e.description_or_default()),
            },
            AuthorizeStageError::Internal(_) => {
                bad_request_page("server_error", "An internal error occurred")
            }
        }
    }
}
