// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the NEST thermostat module.
//!
//! Failures are split by where they happen: value validation, vendor
//! transport, snapshot parsing and inbound command validation. None of them
//! are retried automatically; the caller decides what to do next.

use thiserror::Error;

use crate::event::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the vendor API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a vendor payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An inbound command failed local validation.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The vendor refused the login.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Device was not found in the registry.
    #[error("device not found")]
    DeviceNotFound,

    /// A device with this id is already registered.
    #[error("device already registered: {0}")]
    DeviceAlreadyRegistered(DeviceId),
}

impl Error {
    /// Returns `true` if the vendor no longer accepts the session token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::Protocol(ProtocolError::UnexpectedStatus {
                    status: 401 | 403,
                    ..
                })
        )
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Unknown temperature display unit.
    #[error("invalid temperature unit: {0}")]
    InvalidUnit(String),

    /// Unknown thermostat mode.
    #[error("invalid thermostat mode: {0}")]
    InvalidMode(String),

    /// Unknown fan mode.
    #[error("invalid fan mode: {0}")]
    InvalidFanMode(String),

    /// A temperature could not be parsed or is not finite.
    #[error("invalid temperature: {0}")]
    InvalidTemperature(String),
}

/// Errors related to the vendor transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with an error payload.
    #[error("vendor error {code}: {message}")]
    Vendor {
        /// Error code reported by the vendor.
        code: String,
        /// Human readable description, if any.
        message: String,
    },

    /// The vendor answered with a non-success status and no error payload.
    #[error("unexpected HTTP status {status}: {reason}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing vendor payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors raised while validating an inbound device command.
///
/// These are always detected before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command kind is not one this module handles.
    #[error("unrecognized command: {0}")]
    Unrecognized(String),

    /// A required parameter was not supplied.
    #[error("command {command} requires parameter {parameter}")]
    MissingParameter {
        /// The command kind.
        command: String,
        /// The missing parameter name.
        parameter: String,
    },

    /// A command with the same request id is still in flight.
    #[error("request {0} is already pending")]
    DuplicateRequest(String),

    /// A parameter was supplied but its value is invalid.
    #[error("invalid value for {parameter}: {source}")]
    InvalidParameter {
        /// The parameter name.
        parameter: String,
        /// Why the value was rejected.
        source: ValueError,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
