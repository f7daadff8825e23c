//! Terminal stage invoked once authentication and consent are complete:
//! mints the code/token, logs the grant, and hands back the redirect.

use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;

use crate::repositories::OAuthAuditLogRepository;

use super::error::AuthorizeStageError;
use super::hash::{at_hash, c_hash};
use super::model::{AuthorizationRequest, GrantType, Provider, PROMPT_CONSENT, PROMPT_NONE};
use super::response::{build_success_response, ResponseParams};
use super::store::{CodeStore, TokenStore};

/// Generate a 128-bit random authorization code, hex-encoded.
fn new_code() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn new_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Fulfils an already-validated, already-consented authorization request:
/// mints the code/token, persists it, emits the audit event, and builds
/// the terminal redirect (or bad-request page) for the caller.
pub struct FulfillmentStage<'a, C, T> {
    pub code_store: &'a C,
    pub token_store: &'a T,
    pub audit_repo: &'a OAuthAuditLogRepository,
    pub issuer: &'a str,
    pub signing_key_pem: &'a str,
}

impl<'a, C, T> FulfillmentStage<'a, C, T>
where
    C: CodeStore,
    T: TokenStore,
{
    pub fn new(
        code_store: &'a C,
        token_store: &'a T,
        audit_repo: &'a OAuthAuditLogRepository,
        issuer: &'a str,
        signing_key_pem: &'a str,
    ) -> Self {
        Self {
            code_store,
            token_store,
            audit_repo,
            issuer,
            signing_key_pem,
        }
    }

    /// Runs the fulfillment stage. `session_ref` identifies the session the
    /// request/grant is tied to; `auth_time` is the time of the user's most
    /// recent authentication.
    pub async fn fulfill(
        &self,
        params: &AuthorizationRequest,
        provider: &Provider,
        user_id: Uuid,
        session_ref: &str,
        auth_time: chrono::DateTime<Utc>,
    ) -> Result<axum::response::Response, AuthorizeStageError> {
        if params.prompt.contains(PROMPT_NONE) && params.prompt.contains(PROMPT_CONSENT) {
            return Ok(super::error::AuthorizeError::new(
                params.redirect_uri.clone(),
                "consent_required",
                params.grant_type_str.clone(),
                params.state.clone(),
            )
            .into_redirect(params.response_mode));
        }

        self.log_authorize_application(provider.id, user_id, &params.scope)
            .await;

        let response_types = params.response_types();
        let grant_type = params.grant_type();

        let mut out = ResponseParams::new().push_always("state", params.state.clone());

        let mut code_value: Option<String> = None;
        if response_types.code {
            let raw_code = new_code();
            let code_hash = crate::utils::secret::hash_oauth_token(&raw_code);
            self.code_store
                .issue(
                    &raw_code,
                    &code_hash,
                    provider.id,
                    user_id,
                    &params.redirect_uri,
                    &params.scope,
                    params.code_challenge.as_deref(),
                    params.code_challenge_method.as_deref(),
                    params.nonce.as_deref(),
                    session_ref,
                    auth_time,
                    None,
                    provider.access_code_validity_secs,
                )
                .await
                .map_err(|_| super::error::OAuth2Error)?;
            code_value = Some(raw_code);
        }

        if grant_type == GrantType::AuthorizationCode {
            if let Some(code) = &code_value {
                out = out.push("code", code.clone());
            }
            return Ok(build_success_response(&params.redirect_uri, params.response_mode, out));
        }

        // Implicit / hybrid: mint an access token, optionally an ID token.
        let mut access_token_value: Option<String> = None;
        if response_types.token {
            let raw_token = new_access_token();
            let token_hash = crate::utils::secret::hash_oauth_token(&raw_token);
            let at = at_hash(&raw_token, provider.signing_alg);

            self.token_store
                .issue(
                    &token_hash,
                    Some(user_id),
                    provider.id,
                    &params.scope,
                    auth_time,
                    session_ref,
                    Some(&at),
                    None,
                    provider.access_token_validity_secs,
                )
                .await
                .map_err(|_| super::error::OAuth2Error)?;

            out = out
                .push("access_token", raw_token.clone())
                .push("token_type", "bearer")
                .push("expires_in", provider.access_token_validity_secs.to_string());

            access_token_value = Some(raw_token);
        } else {
            out = out
                .push("token_type", "bearer")
                .push("expires_in", provider.access_token_validity_secs.to_string());
        }

        if response_types.id_token {
            let at_hash_claim = access_token_value
                .as_deref()
                .map(|tok| at_hash(tok, provider.signing_alg));
            let c_hash_claim = code_value.as_deref().map(|code| c_hash(code, provider.signing_alg));

            let id_token_jws = self
                .sign_id_token(provider, user_id, params, auth_time, at_hash_claim, c_hash_claim)
                .map_err(|_| super::error::OAuth2Error)?;
            out = out.push("id_token", id_token_jws);
        }

        if grant_type == GrantType::Hybrid {
            if let Some(code) = &code_value {
                out = out.push("code", code.clone());
            }
        }

        Ok(build_success_response(&params.redirect_uri, params.response_mode, out))
    }

    async fn log_authorize_application(
        &self,
        client_id: Uuid,
        user_id: Uuid,
        scopes: &std::collections::HashSet<String>,
    ) {
        let scopes: Vec<String> = scopes.iter().cloned().collect();
        super::audit::log_authorize_application(self.audit_repo, client_id, user_id, &scopes).await;
    }

    fn sign_id_token(
        &self,
        provider: &Provider,
        user_id: Uuid,
        params: &AuthorizationRequest,
        auth_time: chrono::DateTime<Utc>,
        at_hash_claim: Option<String>,
        c_hash_claim: Option<String>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let now = Utc::now();
        let claims = super::model::IDTokenClaims {
            iss: self.issuer.to_string(),
            sub: user_id.to_string(),
            aud: provider.client_id.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(provider.access_token_validity_secs)).timestamp(),
            auth_time: auth_time.timestamp(),
            nonce: params.nonce.clone(),
            c_hash: c_hash_claim,
            at_hash: at_hash_claim,
        };

        let alg = match provider.signing_alg {
            super::model::SigningAlg::Rs256 => Algorithm::RS256,
            super::model::SigningAlg::Rs384 => Algorithm::RS384,
            super::model::SigningAlg::Rs512 => Algorithm::RS512,
        };

        let key = EncodingKey::from_rsa_pem(self.signing_key_pem.as_bytes())?;
        encode(&Header::new(alg), &claims, &key)
    }
}
