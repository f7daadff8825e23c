//! Assembles the terminal HTTP response for a successful or failed
//! authorization: a `query`/`fragment` redirect, or a `form_post`
//! auto-submitting HTML page.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use url::Url;

use super::model::ResponseMode;

/// An ordered bag of response parameters (code/token/id_token/state/...),
/// rendered differently depending on the response_mode.
#[derive(Debug, Clone, Default)]
pub struct ResponseParams {
    pairs: Vec<(String, String)>,
}

impl ResponseParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value));
        }
        self
    }

    pub fn push_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Unlike `push`, always includes the pair even when the value is empty.
    /// `state` must round-trip exactly as the RP sent it, including "".
    pub fn push_always(mut self, key: &str, value: impl Into<String>) -> Self {
        self.pairs.push((key.to_string(), value.into()));
        self
    }

    /// Renders as a standalone `application/x-www-form-urlencoded` string,
    /// for callers building a URL outside the success/error response path
    /// (e.g. a re-authentication redirect carrying the original request).
    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.pairs)
    }
}

fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn append_query(redirect_uri: &str, params: &ResponseParams) -> String {
    match Url::parse(redirect_uri) {
        Ok(mut url) => {
            {
                let mut pairs = url.query_pairs_mut();
                for (k, v) in &params.pairs {
                    pairs.append_pair(k, v);
                }
            }
            url.to_string()
        }
        Err(_) => {
            let qs = encode_pairs(&params.pairs);
            let sep = if redirect_uri.contains('?') { '&' } else { '?' };
            format!("{redirect_uri}{sep}{qs}")
        }
    }
}

fn append_fragment(redirect_uri: &str, params: &ResponseParams) -> String {
    let fragment = encode_pairs(&params.pairs);
    let sep = if redirect_uri.contains('#') { '&' } else { '#' };
    format!("{redirect_uri}{sep}{fragment}")
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn form_post_page(redirect_uri: &str, params: &ResponseParams) -> Response {
    let inputs: String = params
        .pairs
        .iter()
        .map(|(k, v)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}"/>"#,
                html_escape(k),
                html_escape(v)
            )
        })
        .collect();

    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Continue</title></head>
<body onload="document.forms[0].submit()">
<form method="post" action="{action}">
{inputs}
<noscript><input type="submit" value="Continue"/></noscript>
</form>
</body>
</html>"#,
        action = html_escape(redirect_uri),
        inputs = inputs,
    );

    Html(body).into_response()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builds the terminal response for a successful authorization, dispatching
/// on the effective response_mode.
pub fn build_success_response(redirect_uri: &str, mode: ResponseMode, params: ResponseParams) -> Response {
    match mode {
        ResponseMode::Query => redirect_found(&append_query(redirect_uri, &params)),
        ResponseMode::Fragment => redirect_found(&append_fragment(redirect_uri, &params)),
        ResponseMode::FormPost => form_post_page(redirect_uri, &params),
    }
}

/// Builds the terminal response for a rejected authorization: same
/// dispatch, carrying `error`/`error_description`/`state` instead.
pub fn build_error_redirect(
    redirect_uri: &str,
    mode: ResponseMode,
    error_code: &str,
    description: &str,
    state: &str,
) -> Response {
    let params = ResponseParams::new()
        .push("error", error_code)
        .push("error_description", description)
        .push_always("state", state);

    build_success_response(redirect_uri, mode, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_mode_appends_params_to_query_string() {
        let params = ResponseParams::new().push("code", "abc").push("state", "xyz");
        let resp = build_success_response("https://rp.example/cb", ResponseMode::Query, params);
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    #[test]
    fn fragment_mode_appends_params_after_hash() {
        let location = append_fragment(
            "https://rp.example/cb",
            &ResponseParams::new().push("access_token", "tok"),
        );
        assert!(location.contains("#access_token=tok"));
    }

    #[test]
    fn query_mode_preserves_existing_query_string() {
        let location = append_query(
            "https://rp.example/cb?already=1",
            &ResponseParams::new().push("code", "abc"),
        );
        assert!(location.contains("already=1"));
        assert!(location.contains("code=abc"));
    }
}
