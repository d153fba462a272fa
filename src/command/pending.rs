// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound command requests and their single outcome.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::ThermostatCommand;
use crate::error::CommandError;
use crate::event::DeviceId;

/// Identifier the gateway assigns to a command request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Wraps a gateway request id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A device command as handed over by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommandRequest {
    /// Target thermostat.
    pub device_id: DeviceId,
    /// Gateway request id.
    pub request_id: RequestId,
    /// Command kind, e.g. `set_mode`.
    pub command: String,
    /// Command parameters.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl DeviceCommandRequest {
    /// Creates a request without parameters.
    #[must_use]
    pub fn new(device_id: DeviceId, request_id: RequestId, command: impl Into<String>) -> Self {
        Self {
            device_id,
            request_id,
            command: command.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A command waiting for the vendor round trip.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    /// Gateway request id.
    pub request_id: RequestId,
    /// Target thermostat.
    pub device_id: DeviceId,
    /// The validated command.
    pub command: ThermostatCommand,
    /// When the timeout guard was armed.
    pub armed_at: Instant,
}

impl PendingCommand {
    /// Arms a pending command now.
    #[must_use]
    pub fn arm(request_id: RequestId, device_id: DeviceId, command: ThermostatCommand) -> Self {
        Self {
            request_id,
            device_id,
            command,
            armed_at: Instant::now(),
        }
    }

    /// Time since the guard was armed.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.armed_at.elapsed()
    }
}

/// The one outcome reported for a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The update was accepted and the confirmation fetch succeeded.
    Completed,
    /// The command failed validation; nothing was sent.
    Rejected(CommandError),
    /// The update or its confirmation failed.
    Failed(String),
    /// The round trip did not finish before the guard fired.
    TimedOut,
}

impl CommandOutcome {
    /// Returns `true` for [`CommandOutcome::Completed`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
