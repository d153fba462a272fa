// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor login sessions and their cache.
//!
//! A login yields a bearer token, the transport URL every other call must
//! go to, the user id and an expiry. The [`SessionCache`] keeps one session
//! per account and only logs in again when the cached one is about to
//! expire.
//!
//! Accounts are keyed by an [`AccountKey`]: a salted SHA-256 digest of the
//! credentials, so the cache never holds plain passwords as keys.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::{Error, ParseError};
use crate::protocol::NestApi;

/// Sessions expiring within this window are refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// TTL in seconds assumed when the login response carries no expiry.
const FALLBACK_TTL_SECS: i64 = 3600;

/// Account credentials for the vendor login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Account user name (an e-mail address).
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a user name and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Salted digest identifying an account in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey(String);

impl AccountKey {
    /// Derives the key for `credentials` under `salt`.
    #[must_use]
    pub fn derive(salt: &[u8], credentials: &Credentials) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(credentials.username.as_bytes());
        // Separator keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update([0u8]);
        hasher.update(credentials.password.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Expiry as reported by the login endpoint.
///
/// Older API revisions send a TTL in seconds, newer ones an HTTP-date
/// string such as `Tue, 01-Jan-2030 00:00:00 GMT`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LoginExpiry {
    /// Seconds from now.
    Seconds(i64),
    /// Absolute date.
    Date(String),
}

impl LoginExpiry {
    /// Resolves the expiry to an absolute instant.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` if the date string is not understood.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
        match self {
            Self::Seconds(secs) => TimeDelta::try_seconds(*secs)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| ParseError::InvalidValue {
                    field: "expires_in".to_string(),
                    message: format!("TTL of {secs} seconds is out of range"),
                }),
            Self::Date(text) => parse_expiry_date(text),
        }
    }
}

fn parse_expiry_date(text: &str) -> Result<DateTime<Utc>, ParseError> {
    const FORMATS: [&str; 2] = ["%a, %d-%b-%Y %H:%M:%S GMT", "%a, %d %b %Y %H:%M:%S GMT"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::InvalidValue {
            field: "expires_in".to_string(),
            message: format!("unrecognized date '{text}'"),
        })
}

/// Transport URLs returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUrls {
    /// Base URL for all authenticated calls.
    pub transport_url: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Vendor user id.
    pub userid: String,
    /// Transport URLs.
    pub urls: LoginUrls,
    /// Token expiry.
    #[serde(default)]
    pub expires_in: Option<LoginExpiry>,
}

/// A cached vendor authentication result.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Base URL for authenticated calls, without a trailing slash.
    pub transport_url: String,
    /// Bearer token.
    pub access_token: String,
    /// Vendor user id.
    pub user_id: String,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session from a login response received at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` if the expiry cannot be understood.
    pub fn from_login(response: LoginResponse, now: DateTime<Utc>) -> Result<Self, ParseError> {
        let expires_at = match &response.expires_in {
            Some(expiry) => expiry.resolve(now)?,
            None => now + TimeDelta::seconds(FALLBACK_TTL_SECS),
        };

        Ok(Self {
            transport_url: response.urls.transport_url.trim_end_matches('/').to_string(),
            access_token: response.access_token,
            user_id: response.userid,
            expires_at,
        })
    }

    /// Returns `true` if the session expires within `margin` of `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(margin)
            .is_none_or(|deadline| self.expires_at <= deadline)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("transport_url", &self.transport_url)
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Per-account cache of vendor sessions.
///
/// Lookups are serialized: while one caller is logging in, others wait and
/// then reuse the fresh session instead of logging in again.
///
/// # Examples
///
/// ```no_run
/// use nest_thermostat::protocol::NestClient;
/// use nest_thermostat::session::{Credentials, SessionCache};
///
/// # async fn example() -> nest_thermostat::Result<()> {
/// let api = NestClient::new()?;
/// let cache = SessionCache::new();
/// let creds = Credentials::new("joe@example.com", "swordfish");
///
/// let session = cache.get_session(&api, &creds).await?;
/// println!("token valid until {}", session.expires_at);
/// # Ok(())
/// # }
/// ```
pub struct SessionCache {
    salt: [u8; 16],
    margin: Duration,
    sessions: Mutex<HashMap<AccountKey, Session>>,
}

impl SessionCache {
    /// Creates an empty cache with a fresh random salt.
    #[must_use]
    pub fn new() -> Self {
        Self::with_margin(DEFAULT_REFRESH_MARGIN)
    }

    /// Creates an empty cache with a custom refresh margin.
    #[must_use]
    pub fn with_margin(margin: Duration) -> Self {
        Self {
            salt: rand::random(),
            margin,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cache key for `credentials`.
    #[must_use]
    pub fn account_key(&self, credentials: &Credentials) -> AccountKey {
        AccountKey::derive(&self.salt, credentials)
    }

    /// Returns a valid session for `credentials`, logging in if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the vendor rejects the login, or
    /// the transport error if the login request itself fails.
    pub async fn get_session<A: NestApi>(
        &self,
        api: &A,
        credentials: &Credentials,
    ) -> Result<Session, Error> {
        self.get_session_at(api, credentials, Utc::now()).await
    }

    /// Same as [`get_session`](Self::get_session) with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`get_session`](Self::get_session).
    pub async fn get_session_at<A: NestApi>(
        &self,
        api: &A,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<Session, Error> {
        let key = self.account_key(credentials);
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get(&key)
            && !session.needs_refresh(now, self.margin)
        {
            return Ok(session.clone());
        }

        tracing::debug!(user = %credentials.username, "Logging in to NEST");
        let response = api.login(credentials).await?;
        let session = Session::from_login(response, now)?;
        tracing::info!(
            user = %credentials.username,
            expires_at = %session.expires_at,
            "NEST session refreshed"
        );

        sessions.insert(key, session.clone());
        Ok(session)
    }

    /// Drops the cached session for `credentials`.
    ///
    /// Returns `true` if a session was cached.
    pub async fn invalidate(&self, credentials: &Credentials) -> bool {
        let key = self.account_key(credentials);
        self.sessions.lock().await.remove(&key).is_some()
    }

    /// Returns the number of cached sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}
