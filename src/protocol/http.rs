// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTPS implementation of [`NestApi`].

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::error::{Error, ParseError, ProtocolError};
use crate::protocol::{NestApi, UpdateTarget, VendorErrorPayload};
use crate::session::{Credentials, LoginResponse, Session};
use crate::telemetry::Snapshot;

// ============================================================================
// ApiConfig - Endpoint and header configuration
// ============================================================================

/// Configuration for the NEST API client.
///
/// # Examples
///
/// ```
/// use nest_thermostat::protocol::ApiConfig;
/// use std::time::Duration;
///
/// // Defaults point at the production login endpoint
/// let config = ApiConfig::new();
/// assert_eq!(config.login_url(), "https://home.nest.com/user/login");
///
/// // Everything can be overridden
/// let config = ApiConfig::new()
///     .with_login_url("http://127.0.0.1:8080/user/login")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    login_url: String,
    user_agent: String,
    protocol_version: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Production login endpoint.
    pub const DEFAULT_LOGIN_URL: &'static str = "https://home.nest.com/user/login";
    /// User agent the mobile app identifies itself with.
    pub const DEFAULT_USER_AGENT: &'static str = "Nest/1.1.0.10 CFNetwork/548.0.4";
    /// Value of the `X-nl-protocol-version` header.
    pub const DEFAULT_PROTOCOL_VERSION: &'static str = "1";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with production defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_url: Self::DEFAULT_LOGIN_URL.to_string(),
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            protocol_version: Self::DEFAULT_PROTOCOL_VERSION.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the login URL.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Sets the user agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the protocol version header.
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the login URL.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Returns the user agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the protocol version header value.
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a [`NestClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the login URL is not absolute or the HTTP client
    /// cannot be created.
    pub fn into_client(self) -> Result<NestClient, ProtocolError> {
        if !(self.login_url.starts_with("http://") || self.login_url.starts_with("https://")) {
            return Err(ProtocolError::InvalidAddress(self.login_url));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(NestClient {
            client,
            config: self,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// NestClient - reqwest-backed API client
// ============================================================================

/// HTTPS client for the NEST cloud API.
///
/// # Examples
///
/// ```no_run
/// use nest_thermostat::protocol::{NestApi, NestClient};
/// use nest_thermostat::session::{Credentials, Session};
///
/// # async fn example() -> nest_thermostat::Result<()> {
/// let client = NestClient::new()?;
/// let login = client
///     .login(&Credentials::new("joe@example.com", "swordfish"))
///     .await?;
/// let session = Session::from_login(login, chrono::Utc::now())?;
/// let snapshot = client.fetch_snapshot(&session).await?;
/// for serial in snapshot.serials() {
///     println!("{serial}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NestClient {
    client: Client,
    config: ApiConfig,
}

impl NestClient {
    /// Creates a client with production defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, ProtocolError> {
        ApiConfig::new().into_client()
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn snapshot_url(session: &Session) -> String {
        format!("{}/v2/mobile/user.{}", session.transport_url, session.user_id)
    }

    fn update_url(session: &Session, target: UpdateTarget, serial: &str) -> String {
        format!(
            "{}/v2/put/{}.{}",
            session.transport_url,
            target.as_str(),
            urlencoding::encode(serial)
        )
    }

    fn login_body(credentials: &Credentials) -> String {
        format!(
            "username={}&password={}",
            urlencoding::encode(&credentials.username),
            urlencoding::encode(&credentials.password)
        )
    }

    /// Adds the headers every authenticated call carries.
    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header(USER_AGENT, &self.config.user_agent)
            .header(AUTHORIZATION, format!("Basic {}", session.access_token))
            .header("X-nl-user-id", &session.user_id)
            .header("X-nl-protocol-version", &self.config.protocol_version)
    }

    /// Sends a request and returns the body, mapping vendor and HTTP errors.
    async fn send(&self, request: RequestBuilder) -> Result<String, ProtocolError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProtocolError::Timeout(duration_millis(self.config.timeout))
            } else {
                ProtocolError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Received NEST response");

        // A rejected token must surface as 401/403 even with an error payload
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(match VendorErrorPayload::detect(&body) {
                Some(payload) => ProtocolError::UnexpectedStatus {
                    status: status.as_u16(),
                    reason: payload.summary(),
                },
                None => unexpected_status(status),
            });
        }

        if let Some(payload) = VendorErrorPayload::detect(&body) {
            return Err(payload.into_protocol_error());
        }

        if !status.is_success() {
            return Err(unexpected_status(status));
        }

        Ok(body)
    }
}

impl NestApi for NestClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, Error> {
        tracing::debug!(url = %self.config.login_url, "Sending NEST login");

        let request = self
            .client
            .post(&self.config.login_url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Self::login_body(credentials));

        let body = match self.send(request).await {
            Ok(body) => body,
            Err(ProtocolError::Vendor { code, message }) => {
                let reason = if message.is_empty() {
                    code
                } else {
                    format!("{code}: {message}")
                };
                return Err(Error::Authentication(reason));
            }
            Err(ProtocolError::UnexpectedStatus { status, reason })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                return Err(Error::Authentication(format!("HTTP {status} {reason}")));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&body).map_err(|e| Error::Parse(ParseError::Json(e)))
    }

    async fn fetch_snapshot(&self, session: &Session) -> Result<Snapshot, Error> {
        let url = Self::snapshot_url(session);
        tracing::debug!(url = %url, "Fetching NEST snapshot");

        let body = self.send(self.authorized(self.client.get(&url), session)).await?;
        serde_json::from_str(&body).map_err(|e| Error::Parse(ParseError::Json(e)))
    }

    async fn post_update(
        &self,
        session: &Session,
        target: UpdateTarget,
        serial: &str,
        body: &serde_json::Value,
    ) -> Result<(), Error> {
        let url = Self::update_url(session, target, serial);
        tracing::debug!(url = %url, body = %body, "Posting NEST update");

        let request = self.authorized(self.client.post(&url), session).json(body);
        self.send(request).await?;
        Ok(())
    }
}

fn unexpected_status(status: StatusCode) -> ProtocolError {
    ProtocolError::UnexpectedStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn session() -> Session {
        Session {
            transport_url: "https://czfe1.transport.home.nest.com".to_string(),
            access_token: "b.token".to_string(),
            user_id: "123".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn config_defaults() {
        let config = ApiConfig::new();
        assert_eq!(config.login_url(), ApiConfig::DEFAULT_LOGIN_URL);
        assert_eq!(config.user_agent(), "Nest/1.1.0.10 CFNetwork/548.0.4");
        assert_eq!(config.protocol_version(), "1");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_builder_chain() {
        let config = ApiConfig::new()
            .with_login_url("http://localhost:9000/login")
            .with_user_agent("test-agent")
            .with_protocol_version("2")
            .with_timeout(Duration::from_secs(3));

        assert_eq!(config.login_url(), "http://localhost:9000/login");
        assert_eq!(config.user_agent(), "test-agent");
        assert_eq!(config.protocol_version(), "2");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn relative_login_url_rejected() {
        let result = ApiConfig::new().with_login_url("home.nest.com/login").into_client();
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn snapshot_url_uses_user_id() {
        assert_eq!(
            NestClient::snapshot_url(&session()),
            "https://czfe1.transport.home.nest.com/v2/mobile/user.123"
        );
    }

    #[test]
    fn update_url_uses_bucket_and_serial() {
        assert_eq!(
            NestClient::update_url(&session(), UpdateTarget::Shared, "09AA01AC"),
            "https://czfe1.transport.home.nest.com/v2/put/shared.09AA01AC"
        );
        assert_eq!(
            NestClient::update_url(&session(), UpdateTarget::Device, "09AA01AC"),
            "https://czfe1.transport.home.nest.com/v2/put/device.09AA01AC"
        );
    }

    #[test]
    fn login_body_is_form_encoded() {
        let body = NestClient::login_body(&Credentials::new("joe@example.com", "p&ss word"));
        assert_eq!(body, "username=joe%40example.com&password=p%26ss%20word");
    }
}
