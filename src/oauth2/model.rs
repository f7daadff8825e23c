use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a provider-configured redirect URI entry is matched against the
/// `redirect_uri` parameter of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectUriMatchMode {
    Strict,
    Regex,
}

impl RedirectUriMatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectUriMatchMode::Strict => "strict",
            RedirectUriMatchMode::Regex => "regex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUriEntry {
    pub mode: RedirectUriMatchMode,
    pub pattern: String,
}

impl RedirectUriEntry {
    pub fn strict(pattern: impl Into<String>) -> Self {
        Self {
            mode: RedirectUriMatchMode::Strict,
            pattern: pattern.into(),
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            mode: RedirectUriMatchMode::Regex,
            pattern: pattern.into(),
        }
    }
}

/// JWT signing algorithm used for ID tokens, determines the `at_hash`/
/// `c_hash` truncation width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlg {
    Rs256,
    Rs384,
    Rs512,
}

impl SigningAlg {
    /// Left-half hash width in bytes for `at_hash`/`c_hash` computation.
    pub fn hash_len(&self) -> usize {
        match self {
            SigningAlg::Rs256 => 16,
            SigningAlg::Rs384 => 24,
            SigningAlg::Rs512 => 32,
        }
    }
}

/// An OAuth2/OIDC client registration, resolved by `client_id`. Stands in
/// for the out-of-scope "Provider" record (blueprint/config loading,
/// policy access checks live outside this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub client_id: String,
    pub redirect_uris: Vec<RedirectUriEntry>,
    pub scope_mappings: Vec<String>,
    pub access_code_validity_secs: i64,
    pub access_token_validity_secs: i64,
    pub signing_alg: SigningAlg,
}

/// Every non-openid-connect response_type token this endpoint understands,
/// tracked as a small set rather than an enum so the response_type-to-
/// grant_type mapping can be expressed as a lookup over combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ResponseTypeSet {
    pub code: bool,
    pub id_token: bool,
    pub token: bool,
}

impl ResponseTypeSet {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut set = ResponseTypeSet::default();
        let mut seen_any = false;
        for tok in raw.split_whitespace() {
            seen_any = true;
            match tok {
                "code" => set.code = true,
                "id_token" => set.id_token = true,
                "token" => set.token = true,
                _ => return None,
            }
        }
        if !seen_any {
            return None;
        }
        Some(set)
    }

    /// The pure function from response_type to grant_type.
    pub fn grant_type(&self) -> Option<GrantType> {
        match (self.code, self.id_token, self.token) {
            (true, false, false) => Some(GrantType::AuthorizationCode),
            (false, true, false) | (false, true, true) => Some(GrantType::Implicit),
            (true, false, true) | (true, true, false) | (true, true, true) => {
                Some(GrantType::Hybrid)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    Implicit,
    Hybrid,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Implicit => "implicit",
            GrantType::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Query,
    Fragment,
    FormPost,
}

impl ResponseMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "query" => Some(Self::Query),
            "fragment" => Some(Self::Fragment),
            "form_post" => Some(Self::FormPost),
            _ => None,
        }
    }

    /// Default is `query` for the code grant, `fragment` otherwise; an
    /// unrecognized caller-supplied value is rewritten to this default
    /// rather than rejected.
    pub fn default_for(grant_type: GrantType) -> Self {
        match grant_type {
            GrantType::AuthorizationCode => ResponseMode::Query,
            GrantType::Implicit | GrantType::Hybrid => ResponseMode::Fragment,
        }
    }
}

pub const PROMPT_NONE: &str = "none";
pub const PROMPT_CONSENT: &str = "consent";
pub const PROMPT_LOGIN: &str = "login";

pub const SCOPE_OPENID: &str = "openid";
pub const SCOPE_OFFLINE_ACCESS: &str = "offline_access";

pub const FORBIDDEN_URI_SCHEMES: &[&str] = &["javascript", "data", "vbscript"];

pub const PKCE_METHOD_PLAIN: &str = "plain";
pub const PKCE_METHOD_S256: &str = "S256";

/// The parsed, validated authorization request. Immutable once constructed;
/// carried across the handoff to the fulfillment stage as plan context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub response_mode: ResponseMode,
    pub grant_type_str: String,
    pub scope: HashSet<String>,
    pub state: String,
    pub nonce: Option<String>,
    pub prompt: HashSet<String>,
    pub max_age: Option<i64>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub github_compat: bool,
}

impl AuthorizationRequest {
    pub fn grant_type(&self) -> GrantType {
        match self.grant_type_str.as_str() {
            "authorization_code" => GrantType::AuthorizationCode,
            "implicit" => GrantType::Implicit,
            _ => GrantType::Hybrid,
        }
    }

    pub fn response_types(&self) -> ResponseTypeSet {
        ResponseTypeSet::parse(&self.response_type).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub auth_time: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub scope: HashSet<String>,
    pub nonce: Option<String>,
    pub session_ref: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub c_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub user_id: Option<Uuid>,
    pub provider_id: Uuid,
    pub scope: HashSet<String>,
    pub expires: DateTime<Utc>,
    pub auth_time: DateTime<Utc>,
    pub session_ref: String,
    pub at_hash: Option<String>,
    pub id_token_jws: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IDTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
}
