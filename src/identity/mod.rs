//! Identity-service wrapper: issue a token from credentials, cache it until
//! expiry, validate and revoke tokens with an admin token.
//!
//! Wire contract: `POST {auth_url}/tokens` issues a token, returned in the
//! `X-Subject-Token` response header with its expiry in the JSON body.
//! `GET`/`DELETE {auth_url}/tokens` validate/revoke the token named by the
//! `X-Subject-Token` request header, authorized by `X-Auth-Token`.

use crate::auth::AUTH_TOKEN_HEADER;
use crate::config::settings::Settings;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Header carrying the token a request is about.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

pub const AUTH_URL_ENV: &str = "AEROSTACK_AUTH_URL";
pub const API_USERNAME_ENV: &str = "AEROSTACK_API_USERNAME";
pub const API_PASSWORD_ENV: &str = "AEROSTACK_API_PASSWORD";
pub const API_MEMBER_ID_ENV: &str = "AEROSTACK_API_MEMBER_ID";

/// ================================
/// Credentials
/// ================================
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(skip)]
    pub auth_url: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,
}

impl Credentials {
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            username: username.into(),
            password: password.into(),
            member_id: None,
            scope: None,
        }
    }

    pub fn with_member_id(mut self, member_id: u64) -> Self {
        self.member_id = Some(member_id);
        self.scope = Some(json!({ "domain": { "id": member_id } }));
        self
    }

    /// Admin credentials from settings, with environment fallbacks for each
    /// field. Fails on any missing required field.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let auth_url = setting_or_env(settings.auth_url.clone(), AUTH_URL_ENV)
            .ok_or_else(|| anyhow!("auth_url missing from settings and {}", AUTH_URL_ENV))?;
        let username = setting_or_env(settings.api_username.clone(), API_USERNAME_ENV)
            .ok_or_else(|| anyhow!("api_username missing from settings and {}", API_USERNAME_ENV))?;
        let password = setting_or_env(settings.api_password.clone(), API_PASSWORD_ENV)
            .ok_or_else(|| anyhow!("api_password missing from settings and {}", API_PASSWORD_ENV))?;
        let member_id = match settings.api_member_id {
            Some(id) => Some(id),
            None => env::var(API_MEMBER_ID_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<u64>().context("invalid member id"))
                .transpose()?,
        };

        let mut credentials = Self::new(auth_url, username, password);
        if let Some(member_id) = member_id {
            credentials = credentials.with_member_id(member_id);
        }
        Ok(credentials)
    }
}

fn setting_or_env(value: Option<String>, env_key: &str) -> Option<String> {
    value.or_else(|| env::var(env_key).ok().filter(|v| !v.is_empty()))
}

/// Token issued by the identity service.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IssuedToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() >= at).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: Option<String>, // RFC 3339
}

/// ================================
/// Token session
/// ================================

/// Session against the identity service. Issues a token from the captured
/// credentials and hands out the cached value until it expires.
#[derive(Debug, Clone)]
pub struct TokenSession {
    credentials: Credentials,
    http: Client,
    cached: Arc<RwLock<Option<IssuedToken>>>,
}

impl TokenSession {
    pub fn new(credentials: Credentials) -> Self {
        let http = Client::builder().build().expect("failed to build HTTP client");
        Self {
            credentials,
            http,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Current token value, issuing a new one when the cache is empty or
    /// expired.
    pub async fn get_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.value.clone());
                }
            }
        }
        let issued = self.issue().await?;
        let value = issued.value.clone();
        *self.cached.write().await = Some(issued);
        Ok(value)
    }

    /// Data of the cached token, if one was issued.
    pub async fn token_data(&self) -> Option<IssuedToken> {
        self.cached.read().await.clone()
    }

    async fn issue(&self) -> Result<IssuedToken> {
        let uri = format!("{}/tokens", self.credentials.auth_url.trim_end_matches('/'));
        let response = self.http.post(&uri).json(&self.credentials).send().await?;
        if !response.status().is_success() {
            bail!("token request failed: {}", response.status());
        }
        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| anyhow!("token response missing {} header", SUBJECT_TOKEN_HEADER))?;
        let body: TokenResponse = response
            .json()
            .await
            .context("failed to parse token response")?;
        let expires_at = body
            .token
            .expires_at
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|at| at.with_timezone(&Utc))
                    .with_context(|| format!("invalid expires_at '{raw}' in token response"))
            })
            .transpose()?;
        tracing::info!(expires_at = ?expires_at, "issued new token");
        Ok(IssuedToken { value, expires_at })
    }
}

/// Session built from the admin credentials in `settings`.
pub fn admin_session(settings: &Settings) -> Result<TokenSession> {
    Ok(TokenSession::new(Credentials::from_settings(settings)?))
}

/// ================================
/// Administrative token operations
/// ================================
#[derive(Debug, Clone)]
pub struct IdentityClient {
    auth_url: String,
    http: Client,
}

impl IdentityClient {
    pub fn new(auth_url: impl Into<String>) -> Self {
        let http = Client::builder().build().expect("failed to build HTTP client");
        Self {
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Whether `subject` is a currently valid token.
    pub async fn validate(&self, admin_token: &str, subject: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.tokens_uri())
            .header(AUTH_TOKEN_HEADER, admin_token)
            .header(SUBJECT_TOKEN_HEADER, subject)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => bail!("token validation failed: {}", status),
        }
    }

    /// Revoke `subject` so it can no longer authenticate calls.
    pub async fn revoke(&self, admin_token: &str, subject: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.tokens_uri())
            .header(AUTH_TOKEN_HEADER, admin_token)
            .header(SUBJECT_TOKEN_HEADER, subject)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("token revocation failed: {}", response.status());
        }
        tracing::info!("revoked token");
        Ok(())
    }

    fn tokens_uri(&self) -> String {
        format!("{}/tokens", self.auth_url)
    }
}
