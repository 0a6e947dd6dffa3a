/*
 * Responsibility
 * - /admin/access/bearer-token の request/response DTO
 * - response に hash は載せない。平文 token は作成時の 1 回だけ返す
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::bearer_token_repo::BearerTokenRow;
use crate::services::auth::scope;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBearerTokenRequest {
    pub name: String,
    pub scopes: Vec<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl CreateBearerTokenRequest {
    /// Returns the de-duplicated scope list in request order.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Vec<String>, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("name must be <= {MAX_NAME_LEN} chars"));
        }
        if self.scopes.is_empty() {
            return Err("scopes must NOT have fewer than 1 items".to_string());
        }
        if let Some(unknown) = self.scopes.iter().find(|s| !scope::is_known(s)) {
            return Err(format!("unknown scope '{unknown}'"));
        }
        if let Some(expires) = self.expires
            && expires <= now
        {
            return Err("expires must be in the future".to_string());
        }

        let mut scopes: Vec<String> = Vec::with_capacity(self.scopes.len());
        for s in &self.scopes {
            if !scopes.contains(s) {
                scopes.push(s.clone());
            }
        }
        Ok(scopes)
    }
}

#[derive(Debug, Serialize)]
pub struct BearerTokenResponse {
    pub id: String,
    pub name: String,
    pub scopes: Vec<String>,
    pub expires: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl From<BearerTokenRow> for BearerTokenResponse {
    fn from(row: BearerTokenRow) -> Self {
        let scopes = match row.scopes.normalize() {
            Ok(scopes) => scopes,
            Err(err) => {
                tracing::warn!(id = %row.id, error = %err, "bearer token has unreadable scopes");
                Vec::new()
            }
        };

        Self {
            id: row.id,
            name: row.name,
            scopes,
            expires: row.expires,
            created: row.created,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedBearerTokenResponse {
    #[serde(flatten)]
    pub token: BearerTokenResponse,
    pub access_token: String,
}

impl std::fmt::Debug for CreatedBearerTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedBearerTokenResponse")
            .field("token", &self.token)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
