use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::oauth2::model::{Provider, RedirectUriEntry, SigningAlg};

/// OAuth Client - represents an external or internal application, and the
/// authorization endpoint's view of a `Provider` record.
/// Requirement 1.1: Store client_id, client_secret, redirect_uris, and is_internal flag
/// Requirement 1.5: Distinguish between Internal_App and External_App
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    pub id: Uuid,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret_hash: String,
    pub name: String,
    pub owner_id: Option<Uuid>,
    pub redirect_uris: Vec<RedirectUriEntry>,
    pub scope_mappings: Vec<String>,
    pub access_code_validity_secs: i64,
    pub access_token_validity_secs: i64,
    pub signing_alg: SigningAlg,
    pub is_internal: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Row type for MySQL query results
#[derive(Debug, Clone, FromRow)]
pub struct OAuthClientRow {
    pub id: String,
    pub client_id: String,
    pub client_secret_hash: String,
    pub name: String,
    pub owner_id: Option<String>,
    pub redirect_uris: serde_json::Value,
    pub scope_mappings: serde_json::Value,
    pub access_code_validity_secs: i64,
    pub access_token_validity_secs: i64,
    pub signing_alg: String,
    pub is_internal: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn parse_signing_alg(raw: &str) -> SigningAlg {
    match raw {
        "RS384" => SigningAlg::Rs384,
        "RS512" => SigningAlg::Rs512,
        _ => SigningAlg::Rs256,
    }
}

pub fn signing_alg_str(alg: SigningAlg) -> &'static str {
    match alg {
        SigningAlg::Rs256 => "RS256",
        SigningAlg::Rs384 => "RS384",
        SigningAlg::Rs512 => "RS512",
    }
}

impl From<OAuthClientRow> for OAuthClient {
    fn from(row: OAuthClientRow) -> Self {
        let redirect_uris: Vec<RedirectUriEntry> =
            serde_json::from_value(row.redirect_uris).unwrap_or_default();
        let scope_mappings: Vec<String> =
            serde_json::from_value(row.scope_mappings).unwrap_or_default();

        Self {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            client_id: row.client_id,
            client_secret_hash: row.client_secret_hash,
            name: row.name,
            owner_id: row.owner_id.and_then(|id| Uuid::parse_str(&id).ok()),
            redirect_uris,
            scope_mappings,
            access_code_validity_secs: row.access_code_validity_secs,
            access_token_validity_secs: row.access_token_validity_secs,
            signing_alg: parse_signing_alg(&row.signing_alg),
            is_internal: row.is_internal,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> for OAuthClient {
    fn from_row(row: &'r sqlx::mysql::MySqlRow) -> Result<Self, sqlx::Error> {
        let oauth_client_row = OAuthClientRow::from_row(row)?;
        Ok(OAuthClient::from(oauth_client_row))
    }
}

impl OAuthClient {
    /// Check if this is an external app (not internal)
    pub fn is_external(&self) -> bool {
        !self.is_internal
    }

    /// Check if a user is the owner of this client
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Project this persisted record onto the authorization endpoint's
    /// `Provider` view.
    pub fn as_provider(&self) -> Provider {
        Provider {
            id: self.id,
            client_id: self.client_id.clone(),
            redirect_uris: self.redirect_uris.clone(),
            scope_mappings: self.scope_mappings.clone(),
            access_code_validity_secs: self.access_code_validity_secs,
            access_token_validity_secs: self.access_token_validity_secs,
            signing_alg: self.signing_alg,
        }
    }
}
