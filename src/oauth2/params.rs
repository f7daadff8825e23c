//! Request params: parses and validates the request envelope, computing
//! the derived grant/response mode.

use std::collections::HashSet;

use serde::Deserialize;

use super::error::{AuthorizeError, AuthorizeStageError, OAuth2Error, RedirectUriError};
use super::model::{
    AuthorizationRequest, GrantType, Provider, ResponseMode, PKCE_METHOD_PLAIN, PKCE_METHOD_S256,
    PROMPT_CONSENT, PROMPT_LOGIN, PROMPT_NONE, SCOPE_OFFLINE_ACCESS, SCOPE_OPENID,
};
use super::redirect::{self, MatchOutcome};
use super::scope;

/// Wire shape of the request envelope. Deserialized directly from either
/// the query string (GET) or the form body (POST) — unknown params are
/// ignored because serde simply won't bind them to a field.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthorizationRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub response_type: String,
    pub response_mode: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub state: Option<String>,
    pub nonce: Option<String>,
    #[serde(default)]
    pub prompt: String,
    pub max_age: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub request: Option<String>,
}

fn split_set(raw: &str) -> HashSet<String> {
    raw.split_whitespace().map(|s| s.to_string()).collect()
}

/// Runs the full validation chain, in order, against an already-resolved
/// provider. Unknown `client_id` is handled by the caller before this
/// function is reached (it needs the provider lookup, an external
/// collaborator).
pub fn validate(
    raw: RawAuthorizationRequest,
    provider: &Provider,
    github_compat: bool,
) -> Result<AuthorizationRequest, AuthorizeStageError> {
    // redirect URI validation runs before grant_type is known, so any
    // RedirectUriError never carries a grant_type.
    let redirect_uri = check_redirect_uri(&raw.redirect_uri, provider)?;

    // response_type -> grant_type. response_mode is resolved first since an
    // unrecognized response_type still has a validated redirect_uri and an
    // explicit (or query-default) response_mode to redirect through.
    let response_types = super::model::ResponseTypeSet::parse(&raw.response_type);
    let explicit_response_mode = raw.response_mode.as_deref().and_then(ResponseMode::parse);
    let grant_type = response_types.and_then(|rt| rt.grant_type()).ok_or_else(|| {
        AuthorizeError::new(
            redirect_uri.clone(),
            "unsupported_response_type",
            "",
            raw.state.clone().unwrap_or_default(),
        )
        .with_response_mode(explicit_response_mode.unwrap_or(ResponseMode::Query))
    })?;

    let response_mode =
        explicit_response_mode.unwrap_or_else(|| ResponseMode::default_for(grant_type));

    let state = raw.state.clone().unwrap_or_default();

    // scope resolution.
    let requested_scope = split_set(&raw.scope);
    let configured: HashSet<String> = provider.scope_mappings.iter().cloned().collect();
    let mut resolved_scope = scope::resolve_scopes(&requested_scope, &configured, github_compat);

    let requires_id_token = raw.response_type.split_whitespace().any(|t| t == "id_token");
    if !resolved_scope.contains(SCOPE_OPENID)
        && (grant_type == GrantType::Hybrid || requires_id_token)
    {
        return Err(AuthorizeError::new(
            redirect_uri,
            "invalid_scope",
            grant_type.as_str(),
            state,
        )
        .with_cause("scope_openid_missing")
        .with_response_mode(response_mode)
        .into());
    }

    if resolved_scope.contains(SCOPE_OFFLINE_ACCESS) && grant_type == GrantType::Implicit {
        // offline_access requires a response_type that implies a code;
        // silently remove it otherwise.
        resolved_scope.remove(SCOPE_OFFLINE_ACCESS);
    }

    // JAR (the `request` parameter) is not supported.
    if raw.request.is_some() {
        return Err(AuthorizeError::new(
            redirect_uri,
            "request_not_supported",
            grant_type.as_str(),
            state,
        )
        .with_response_mode(response_mode)
        .into());
    }

    // nonce requirement.
    let nonce = raw.nonce.clone();
    if requires_id_token && resolved_scope.contains(SCOPE_OPENID) && nonce.as_deref().unwrap_or("").is_empty()
    {
        return Err(AuthorizeError::new(
            redirect_uri,
            "invalid_request",
            grant_type.as_str(),
            state,
        )
        .with_cause("nonce_missing")
        .with_response_mode(response_mode)
        .into());
    }

    // code_challenge_method check: defaults to "plain" when a
    // code_challenge is given without a method.
    let code_challenge_method = if raw.code_challenge.is_some() {
        Some(
            raw.code_challenge_method
                .clone()
                .unwrap_or_else(|| PKCE_METHOD_PLAIN.to_string()),
        )
    } else {
        raw.code_challenge_method.clone()
    };
    if let (Some(_), Some(method)) = (&raw.code_challenge, &code_challenge_method) {
        if method != PKCE_METHOD_PLAIN && method != PKCE_METHOD_S256 {
            return Err(AuthorizeError::new(
                redirect_uri,
                "invalid_request",
                grant_type.as_str(),
                state,
            )
            .with_description(format!("Unsupported challenge method {}", method))
            .with_response_mode(response_mode)
            .into());
        }
    }

    let prompt = split_set(&raw.prompt)
        .into_iter()
        .filter(|p| p == PROMPT_NONE || p == PROMPT_CONSENT || p == PROMPT_LOGIN)
        .collect();

    let max_age = raw
        .max_age
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>())
        .transpose()
        .map_err(|_| OAuth2Error)?;

    Ok(AuthorizationRequest {
        client_id: raw.client_id,
        redirect_uri,
        response_type: raw.response_type,
        response_mode,
        grant_type_str: grant_type.as_str().to_string(),
        scope: resolved_scope,
        state,
        nonce,
        prompt,
        max_age,
        code_challenge: raw.code_challenge,
        code_challenge_method,
        github_compat,
    })
}

/// redirect_uri validation, including the auto-provisioning of an empty
/// allow-list (preserved for backward compatibility). Returns the
/// validated `redirect_uri` string on success.
fn check_redirect_uri(redirect_uri: &str, provider: &Provider) -> Result<String, RedirectUriError> {
    if redirect_uri.is_empty() {
        return Err(RedirectUriError::new(redirect_uri, vec![]).with_cause("redirect_uri_missing"));
    }

    let allowed = if provider.redirect_uris.is_empty() {
        // Auto-provisioning happens in the caller, which owns persistence;
        // here we just treat the empty list as "this one URI, strictly".
        vec![super::model::RedirectUriEntry::strict(redirect_uri)]
    } else {
        provider.redirect_uris.clone()
    };

    match redirect::matches(redirect_uri, &allowed) {
        MatchOutcome::Matched => Ok(redirect_uri.to_string()),
        MatchOutcome::NoMatch => Err(RedirectUriError::new(
            redirect_uri,
            allowed.iter().map(|e| e.pattern.clone()).collect(),
        )
        .with_cause("redirect_uri_no_match")),
        MatchOutcome::ForbiddenScheme => Err(RedirectUriError::new(
            redirect_uri,
            allowed.iter().map(|e| e.pattern.clone()).collect(),
        )
        .with_cause("redirect_uri_forbidden_scheme")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::model::{RedirectUriEntry, SigningAlg};
    use uuid::Uuid;

    pub(super) fn provider(redirect_uris: Vec<RedirectUriEntry>, scopes: &[&str]) -> Provider {
        Provider {
            id: Uuid::new_v4(),
            client_id: "CID".to_string(),
            redirect_uris,
            scope_mappings: scopes.iter().map(|s| s.to_string()).collect(),
            access_code_validity_secs: 600,
            access_token_validity_secs: 3600,
            signing_alg: SigningAlg::Rs256,
        }
    }

    pub(super) fn raw(response_type: &str) -> RawAuthorizationRequest {
        RawAuthorizationRequest {
            client_id: "CID".to_string(),
            redirect_uri: "https://rp.example/cb".to_string(),
            response_type: response_type.to_string(),
            response_mode: None,
            scope: "openid profile".to_string(),
            state: Some("xyz".to_string()),
            nonce: Some("n".to_string()),
            prompt: String::new(),
            max_age: None,
            code_challenge: None,
            code_challenge_method: None,
            request: None,
        }
    }

    #[test]
    fn code_grant_defaults_to_query_mode() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid", "profile"],
        );
        let req = validate(raw("code"), &p, false).unwrap();
        assert_eq!(req.grant_type(), GrantType::AuthorizationCode);
        assert_eq!(req.response_mode, ResponseMode::Query);
    }

    #[test]
    fn implicit_grant_defaults_to_fragment_mode() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid", "profile"],
        );
        let req = validate(raw("id_token"), &p, false).unwrap();
        assert_eq!(req.grant_type(), GrantType::Implicit);
        assert_eq!(req.response_mode, ResponseMode::Fragment);
    }

    #[test]
    fn unsupported_response_type_errors() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid"],
        );
        let err = validate(raw("garbage"), &p, false).unwrap_err();
        match err {
            AuthorizeStageError::Authorize(e) => {
                assert_eq!(e.error_code, "unsupported_response_type");
                assert_eq!(e.response_mode, Some(ResponseMode::Query));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn missing_nonce_for_id_token_flow_errors() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid"],
        );
        let mut r = raw("id_token");
        r.nonce = None;
        let err = validate(r, &p, false).unwrap_err();
        match err {
            AuthorizeStageError::Authorize(e) => {
                assert_eq!(e.error_code, "invalid_request");
                assert_eq!(e.cause, Some("nonce_missing"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn offline_access_removed_for_implicit_flow() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid", "offline_access"],
        );
        let mut r = raw("id_token");
        r.scope = "openid offline_access".to_string();
        let req = validate(r, &p, false).unwrap();
        assert!(!req.scope.contains(SCOPE_OFFLINE_ACCESS));
    }

    #[test]
    fn offline_access_kept_for_code_flow() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid", "offline_access"],
        );
        let mut r = raw("code");
        r.scope = "openid offline_access".to_string();
        let req = validate(r, &p, false).unwrap();
        assert!(req.scope.contains(SCOPE_OFFLINE_ACCESS));
    }

    #[test]
    fn request_param_presence_is_rejected() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid"],
        );
        let mut r = raw("code");
        r.request = Some("some.jwt".to_string());
        let err = validate(r, &p, false).unwrap_err();
        match err {
            AuthorizeStageError::Authorize(e) => assert_eq!(e.error_code, "request_not_supported"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn empty_redirect_uri_rejected_before_grant_check() {
        let p = provider(vec![], &["openid"]);
        let mut r = raw("code");
        r.redirect_uri = String::new();
        let err = validate(r, &p, false).unwrap_err();
        match err {
            AuthorizeStageError::RedirectUri(e) => assert_eq!(e.cause, "redirect_uri_missing"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn state_round_trips_including_empty() {
        let p = provider(
            vec![RedirectUriEntry::strict("https://rp.example/cb")],
            &["openid"],
        );
        let mut r = raw("code");
        r.state = None;
        let req = validate(r, &p, false).unwrap();
        assert_eq!(req.state, "");
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::*;
    use super::*;
    use crate::oauth2::model::RedirectUriEntry;
    use proptest::prelude::*;

    fn response_type_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("code".to_string()),
            Just("id_token".to_string()),
            Just("token id_token".to_string()),
            Just("code id_token".to_string()),
            Just("code token".to_string()),
            Just("code token id_token".to_string()),
        ]
    }

    proptest! {
        // Invariant 1: grant_type is determined solely by response_type.
        #[test]
        fn grant_type_depends_only_on_response_type(
            response_type in response_type_strategy(),
            state in ".*",
            nonce in ".*",
        ) {
            let p = provider(
                vec![RedirectUriEntry::strict("https://rp.example/cb")],
                &["openid", "profile"],
            );
            let mut r = raw(&response_type);
            r.state = Some(state);
            r.nonce = Some(if nonce.is_empty() { "n".to_string() } else { nonce });
            if let Ok(req) = validate(r, &p, false) {
                let expected = super::super::model::ResponseTypeSet::parse(&response_type)
                    .and_then(|rt| rt.grant_type())
                    .unwrap();
                prop_assert_eq!(req.grant_type(), expected);
            }
        }

        // Invariant 2: response_mode defaults to query for the code grant,
        // fragment otherwise, whenever the request omits response_mode.
        #[test]
        fn default_response_mode_matches_grant_type(response_type in response_type_strategy()) {
            let p = provider(
                vec![RedirectUriEntry::strict("https://rp.example/cb")],
                &["openid", "profile"],
            );
            let req = validate(raw(&response_type), &p, false).unwrap();
            let expected = ResponseMode::default_for(req.grant_type());
            prop_assert_eq!(req.response_mode, expected);
        }

        // Invariant 6: state round-trips exactly, including the empty string.
        #[test]
        fn state_round_trips_for_any_value(state in ".*") {
            let p = provider(
                vec![RedirectUriEntry::strict("https://rp.example/cb")],
                &["openid"],
            );
            let mut r = raw("code");
            r.state = Some(state.clone());
            let req = validate(r, &p, false).unwrap();
            prop_assert_eq!(req.state, state);
        }

        // Invariant 4: offline_access only survives for response_types that
        // imply a code (authorization_code, hybrid); implicit drops it.
        #[test]
        fn offline_access_survives_only_alongside_a_code(response_type in response_type_strategy()) {
            let p = provider(
                vec![RedirectUriEntry::strict("https://rp.example/cb")],
                &["openid", "offline_access"],
            );
            let mut r = raw(&response_type);
            r.scope = "openid offline_access".to_string();
            let req = validate(r, &p, false).unwrap();
            let has_code = response_type.split_whitespace().any(|t| t == "code");
            prop_assert_eq!(req.scope.contains(SCOPE_OFFLINE_ACCESS), has_code);
        }

        // Invariant 5: forbidden schemes are rejected regardless of the
        // allow-list, even one that maliciously lists the exact URI.
        #[test]
        fn forbidden_scheme_always_rejected(path in "[a-z(]{0,12}", scheme in "javascript|data|vbscript") {
            let uri = format!("{scheme}:{path}");
            let p = provider(vec![RedirectUriEntry::strict(uri.clone())], &["openid"]);
            let mut r = raw("code");
            r.redirect_uri = uri;
            let err = validate(r, &p, false).unwrap_err();
            match err {
                AuthorizeStageError::RedirectUri(e) => {
                    prop_assert_eq!(e.cause, "redirect_uri_forbidden_scheme");
                }
                _ => prop_assert!(false, "expected a RedirectUriError"),
            }
        }
    }
}
