use std::sync::Mutex;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh when the cached token is within this many seconds of expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Exchanges a service-account credential for bearer tokens and caches the
/// result until shortly before expiry.
pub struct TokenProvider {
    client_email: String,
    signing_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(config: &Config, http: reqwest::Client) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| Error::Auth(format!("invalid private key: {e}")))?;

        Ok(TokenProvider {
            client_email: config.client_email.clone(),
            signing_key,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, reusing the cached one when fresh.
    pub async fn token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        if let Some(cached) = self.cached.lock().unwrap().as_ref() {
            if cached.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.fetch_token(now).await?;
        *self.cached.lock().unwrap() = Some(token.clone());
        Ok(token.access_token)
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken> {
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: TOKEN_URL.to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| Error::Auth(format!("failed to sign assertion: {e}")))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self.http.post(TOKEN_URL).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;

        log::debug!("obtained access token, valid {}s", token.expires_in);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}
