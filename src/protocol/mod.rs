// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport to the NEST cloud API.
//!
//! The API surface used by this module is small:
//!
//! - a form-encoded login that returns a bearer token and a transport URL,
//! - a GET of the per-user snapshot (`/v2/mobile/user.<userid>`),
//! - partial-update POSTs to the `shared` and `device` buckets of a
//!   thermostat (`/v2/put/<bucket>.<serial>`).
//!
//! [`NestApi`] abstracts these calls so the rest of the crate can be driven
//! by [`NestClient`] in production and by in-process fakes in tests.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{ApiConfig, NestClient};

use std::fmt;

use serde::Deserialize;

use crate::error::{Error, ProtocolError};
use crate::session::{Credentials, LoginResponse, Session};
use crate::telemetry::Snapshot;

/// Bucket of a thermostat that a partial update is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTarget {
    /// Values shared between the thermostat and the cloud (setpoint, mode).
    Shared,
    /// Device-local settings (fan mode).
    Device,
}

impl UpdateTarget {
    /// Returns the bucket name used in the URL.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for clients that can talk to the NEST cloud API.
#[allow(async_fn_in_trait)]
pub trait NestApi {
    /// Logs in with account credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the vendor rejects the credentials
    /// and `Error::Protocol` if the request fails.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, Error>;

    /// Fetches the full per-user snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` on transport or vendor errors and
    /// `Error::Parse` if the snapshot cannot be decoded.
    async fn fetch_snapshot(&self, session: &Session) -> Result<Snapshot, Error>;

    /// Posts a partial update to one bucket of a thermostat.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` on transport or vendor errors.
    async fn post_update(
        &self,
        session: &Session,
        target: UpdateTarget,
        serial: &str,
        body: &serde_json::Value,
    ) -> Result<(), Error>;
}

/// Error payload the vendor returns instead of a result.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VendorErrorPayload {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl VendorErrorPayload {
    /// Extracts an error payload from a response body, if there is one.
    pub(crate) fn detect(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str::<Self>(trimmed).ok()
    }

    pub(crate) fn message(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_default()
    }

    /// Returns `code: message`, or just the code without a message.
    pub(crate) fn summary(&self) -> String {
        let message = self.message();
        if message.is_empty() {
            self.error.clone()
        } else {
            format!("{}: {message}", self.error)
        }
    }

    pub(crate) fn into_protocol_error(self) -> ProtocolError {
        let message = self.message();
        ProtocolError::Vendor {
            code: self.error,
            message,
        }
    }
}
