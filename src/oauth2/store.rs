//! Persistence adapter over the repository layer: resolves `Provider`s by
//! client_id, issues authorization codes, and issues access tokens. Thin
//! wrappers so the core state machine depends on narrow traits instead of
//! concrete `sqlx` repositories.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::OAuthError;
use crate::repositories::{AuthorizationCodeRepository, OAuthClientRepository, OAuthTokenRepository};

use super::model::{AccessToken, AuthorizationCode, Provider, RedirectUriEntry, SigningAlg};

/// Looks up a `Provider` registration by its public `client_id`.
#[async_trait::async_trait]
pub trait ProviderStore: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Provider>, OAuthError>;

    /// Persists the auto-provisioned redirect_uri entry for a provider that
    /// had an empty allow-list, so the next request resolves it normally.
    async fn auto_provision_redirect_uri(
        &self,
        provider_id: Uuid,
        entry: RedirectUriEntry,
    ) -> Result<(), OAuthError>;
}

#[async_trait::async_trait]
impl ProviderStore for OAuthClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Provider>, OAuthError> {
        let client = self.find_active_by_client_id(client_id).await?;
        Ok(client.map(|c| c.as_provider()))
    }

    async fn auto_provision_redirect_uri(
        &self,
        provider_id: Uuid,
        entry: RedirectUriEntry,
    ) -> Result<(), OAuthError> {
        if let Some(client) = self.find_by_id(provider_id).await? {
            let mut uris = client.redirect_uris;
            uris.push(entry);
            self.update(provider_id, &client.name, &uris).await?;
        }
        Ok(())
    }
}

/// Issues and looks up authorization codes.
#[async_trait::async_trait]
pub trait CodeStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        raw_code: &str,
        code_hash: &str,
        provider_id: Uuid,
        user_id: Uuid,
        redirect_uri: &str,
        scope: &HashSet<String>,
        code_challenge: Option<&str>,
        code_challenge_method: Option<&str>,
        nonce: Option<&str>,
        session_ref: &str,
        auth_time: DateTime<Utc>,
        c_hash: Option<&str>,
        validity_secs: i64,
    ) -> Result<AuthorizationCode, OAuthError>;
}

#[async_trait::async_trait]
impl CodeStore for AuthorizationCodeRepository {
    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        _raw_code: &str,
        code_hash: &str,
        provider_id: Uuid,
        user_id: Uuid,
        redirect_uri: &str,
        scope: &HashSet<String>,
        code_challenge: Option<&str>,
        code_challenge_method: Option<&str>,
        nonce: Option<&str>,
        session_ref: &str,
        auth_time: DateTime<Utc>,
        c_hash: Option<&str>,
        validity_secs: i64,
    ) -> Result<AuthorizationCode, OAuthError> {
        let scopes: Vec<String> = scope.iter().cloned().collect();
        let row = self
            .create(
                code_hash,
                provider_id,
                user_id,
                redirect_uri,
                &scopes,
                code_challenge,
                code_challenge_method,
                nonce,
                session_ref,
                auth_time,
                c_hash,
                validity_secs,
            )
            .await?;

        Ok(AuthorizationCode {
            code: code_hash.to_string(),
            user_id: row.user_id,
            provider_id: row.client_id,
            auth_time: row.auth_time,
            expires: row.expires_at,
            scope: row.scopes.into_iter().collect(),
            nonce: row.nonce,
            session_ref: row.session_ref,
            code_challenge: row.code_challenge,
            code_challenge_method: row.code_challenge_method,
            c_hash: row.c_hash,
        })
    }
}

/// Issues access tokens (and, for the implicit/hybrid grants, an
/// accompanying signed ID token carried alongside it).
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        token_hash: &str,
        user_id: Option<Uuid>,
        provider_id: Uuid,
        scope: &HashSet<String>,
        auth_time: DateTime<Utc>,
        session_ref: &str,
        at_hash: Option<&str>,
        id_token_jws: Option<&str>,
        validity_secs: i64,
    ) -> Result<AccessToken, OAuthError>;
}

#[async_trait::async_trait]
impl TokenStore for OAuthTokenRepository {
    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        token_hash: &str,
        user_id: Option<Uuid>,
        provider_id: Uuid,
        scope: &HashSet<String>,
        auth_time: DateTime<Utc>,
        session_ref: &str,
        at_hash: Option<&str>,
        id_token_jws: Option<&str>,
        validity_secs: i64,
    ) -> Result<AccessToken, OAuthError> {
        let scopes: Vec<String> = scope.iter().cloned().collect();
        let row = self
            .create(
                user_id,
                provider_id,
                token_hash,
                None,
                &scopes,
                auth_time,
                session_ref,
                at_hash,
                id_token_jws,
                validity_secs,
            )
            .await?;

        Ok(AccessToken {
            token: token_hash.to_string(),
            user_id: row.user_id,
            provider_id: row.client_id,
            scope: row.scopes.into_iter().collect(),
            expires: row.expires_at,
            auth_time: row.auth_time,
            session_ref: row.session_ref,
            at_hash: row.at_hash,
            id_token_jws: row.id_token,
        })
    }
}

pub fn default_signing_alg() -> SigningAlg {
    SigningAlg::Rs256
}
