// =============================================================================
// GOOGLE OAUTH2 FOR DRIVE ACCESS
// =============================================================================
//
// Two credential sources are supported, tried in this order:
//
// 1. **Service Account** (unattended use):
//    - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the JSON key file
//    - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly
//    The survey folder must be shared with the service account email.
//
// 2. **Authorized user** (`token.json` from a desktop OAuth consent flow):
//    - `GOOGLE_TOKEN_FILE` - Path to the file (default `token.json`)
//    The file needs `client_id`, `client_secret` and `refresh_token`.
//
// Both exchange their credentials for a short-lived access token that is
// cached until a minute before it expires.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

type AuthResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// =============================================================================
// TOKEN CACHE
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

#[derive(Default)]
struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    fn seeded(token: String, expires_at: SystemTime) -> Self {
        Self {
            inner: RwLock::new(Some(CachedToken { token, expires_at })),
        }
    }

    async fn fresh(&self) -> Option<String> {
        let cached = self.inner.read().await;
        cached
            .as_ref()
            .filter(|t| t.expires_at > SystemTime::now() + Duration::from_secs(60))
            .map(|t| t.token.clone())
    }

    async fn store(&self, response: &TokenResponse) {
        let mut cached = self.inner.write().await;
        *cached = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });
    }
}

async fn exchange(client: &Client, token_uri: &str, form: &[(&str, &str)]) -> AuthResult<TokenResponse> {
    let response = client.post(token_uri).form(form).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(format!("Token exchange failed ({}): {}", status, text).into());
    }

    Ok(response.json().await?)
}

// =============================================================================
// SERVICE ACCOUNT
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    /// PEM encoded RSA key.
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for the service-account bearer grant.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// At most one hour after `iat`.
    exp: u64,
}

pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cache: TokenCache,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &Path) -> AuthResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> AuthResult<Self> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cache: TokenCache::default(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    fn signed_assertion(&self) -> AuthResult<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DRIVE_READONLY_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    pub async fn get_access_token(&self) -> AuthResult<String> {
        if let Some(token) = self.cache.fresh().await {
            return Ok(token);
        }

        let jwt = self.signed_assertion()?;
        let response = exchange(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ],
        )
        .await?;

        self.cache.store(&response).await;
        Ok(response.access_token)
    }
}

// =============================================================================
// AUTHORIZED USER (token.json)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct AuthorizedUserCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    /// Last access token written by the consent flow, if any.
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

pub struct AuthorizedUserAuth {
    credentials: AuthorizedUserCredentials,
    client: Client,
    cache: TokenCache,
}

impl AuthorizedUserAuth {
    pub async fn from_file(path: &Path) -> AuthResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> AuthResult<Self> {
        let credentials: AuthorizedUserCredentials = serde_json::from_str(json)?;

        // A still-valid token from the consent flow saves one round trip.
        let cache = match (&credentials.token, credentials.expiry) {
            (Some(token), Some(expiry)) => {
                TokenCache::seeded(token.clone(), SystemTime::from(expiry))
            }
            _ => TokenCache::default(),
        };

        Ok(Self {
            credentials,
            client: Client::new(),
            cache,
        })
    }

    pub async fn get_access_token(&self) -> AuthResult<String> {
        if let Some(token) = self.cache.fresh().await {
            return Ok(token);
        }

        tracing::debug!("Refreshing Google access token");
        let response = exchange(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
                ("refresh_token", &self.credentials.refresh_token),
            ],
        )
        .await?;

        self.cache.store(&response).await;
        Ok(response.access_token)
    }
}

// =============================================================================
// CREDENTIAL SELECTION
// =============================================================================

/// Where the Drive credentials come from, resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// `GOOGLE_SERVICE_ACCOUNT_KEY`
    ServiceAccountFile(PathBuf),
    /// `GOOGLE_SERVICE_ACCOUNT_JSON`
    ServiceAccountJson(String),
    /// `GOOGLE_TOKEN_FILE`, or `token.json` by default
    TokenFile(PathBuf),
}

pub enum GoogleAuth {
    ServiceAccount(ServiceAccountAuth),
    AuthorizedUser(AuthorizedUserAuth),
}

impl GoogleAuth {
    pub async fn from_source(source: &CredentialSource) -> AuthResult<Self> {
        match source {
            CredentialSource::ServiceAccountFile(path) => {
                let auth = ServiceAccountAuth::from_file(path).await?;
                tracing::info!("Using Drive service account {}", auth.client_email());
                Ok(Self::ServiceAccount(auth))
            }
            CredentialSource::ServiceAccountJson(json) => {
                let auth = ServiceAccountAuth::from_json(json)?;
                tracing::info!("Using Drive service account {}", auth.client_email());
                Ok(Self::ServiceAccount(auth))
            }
            CredentialSource::TokenFile(token_file) => {
                if !tokio::fs::try_exists(token_file).await.unwrap_or(false) {
                    return Err(format!(
                        "No Google credentials found. Set GOOGLE_SERVICE_ACCOUNT_KEY or \
                         GOOGLE_SERVICE_ACCOUNT_JSON, or place an authorized-user token at {} \
                         (client_id, client_secret, refresh_token).",
                        token_file.display()
                    )
                    .into());
                }
                tracing::info!("Using Drive user credentials from {}", token_file.display());
                Ok(Self::AuthorizedUser(
                    AuthorizedUserAuth::from_file(token_file).await?,
                ))
            }
        }
    }

    pub async fn get_access_token(&self) -> AuthResult<String> {
        match self {
            Self::ServiceAccount(auth) => auth.get_access_token().await,
            Self::AuthorizedUser(auth) => auth.get_access_token().await,
        }
    }
}
