// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound interface towards the gateway host.
//!
//! The module never talks to the host directly; everything goes through a
//! [`HostSink`]. The [`EventBus`] implementation turns each call into a
//! [`GatewayEvent`] so several gateway components can observe it.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::command::RequestId;
use crate::event::{DeviceId, EventBus, GatewayEvent};
use crate::telemetry::NormalizedStatus;
use crate::types::TemperatureUnit;

/// A published thermostat status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Thermostat the status belongs to.
    pub device_id: DeviceId,
    /// Machine label of the thermostat.
    pub machine_label: String,
    /// One-line summary in the display unit.
    pub human_status: String,
    /// Measured temperature in °C.
    pub machine_status: f64,
    /// Full normalized status, temperatures in °C.
    pub status: NormalizedStatus,
    /// Display unit the summary was rendered in.
    pub unit: TemperatureUnit,
}

/// A value stored under a state key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Numeric state.
    Number(f64),
    /// Textual state.
    Text(String),
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Sink for everything the module reports to the host.
///
/// Calls must not block; implementations hand the data off and return.
pub trait HostSink: Send + Sync {
    /// Publishes a thermostat status.
    fn publish_status(&self, report: StatusReport);

    /// Sets a named state value.
    fn set_state(&self, key: &str, value: StateValue);

    /// Records a statistic sample averaged over `bucket`.
    fn record_statistic(&self, label: &str, value: f64, bucket: Duration);

    /// A command was accepted and is being processed.
    fn command_received(&self, request_id: &RequestId, device_id: DeviceId);

    /// A command completed.
    fn command_done(&self, request_id: &RequestId, device_id: DeviceId);

    /// A command failed; `message` is shown to the user.
    fn command_failed(&self, request_id: &RequestId, device_id: DeviceId, message: &str);
}

impl HostSink for EventBus {
    fn publish_status(&self, report: StatusReport) {
        self.publish(GatewayEvent::StatusPublished(report));
    }

    fn set_state(&self, key: &str, value: StateValue) {
        self.publish(GatewayEvent::StateSet {
            key: key.to_string(),
            value,
        });
    }

    fn record_statistic(&self, label: &str, value: f64, bucket: Duration) {
        self.publish(GatewayEvent::StatisticRecorded {
            label: label.to_string(),
            value,
            bucket,
        });
    }

    fn command_received(&self, request_id: &RequestId, device_id: DeviceId) {
        self.publish(GatewayEvent::CommandReceived {
            request_id: request_id.clone(),
            device_id,
        });
    }

    fn command_done(&self, request_id: &RequestId, device_id: DeviceId) {
        self.publish(GatewayEvent::CommandDone {
            request_id: request_id.clone(),
            device_id,
        });
    }

    fn command_failed(&self, request_id: &RequestId, device_id: DeviceId, message: &str) {
        self.publish(GatewayEvent::CommandFailed {
            request_id: request_id.clone(),
            device_id,
            message: message.to_string(),
        });
    }
}
