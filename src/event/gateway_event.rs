// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway event types.

use std::time::Duration;

use serde::Serialize;

use super::DeviceId;
use crate::command::RequestId;
use crate::host::{StateValue, StatusReport};

/// Everything the module hands to the gateway host.
///
/// Each [`HostSink`](crate::host::HostSink) call on an
/// [`EventBus`](super::EventBus) becomes exactly one event.
///
/// # Examples
///
/// ```
/// use nest_thermostat::command::RequestId;
/// use nest_thermostat::event::{DeviceId, GatewayEvent};
///
/// let event = GatewayEvent::CommandDone {
///     request_id: RequestId::new("r-1"),
///     device_id: DeviceId::new(),
/// };
/// assert!(event.is_command_outcome());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A thermostat status was published.
    StatusPublished(StatusReport),

    /// A named state value was set.
    StateSet {
        /// State key, e.g. `thermostat.hall.humidity`.
        key: String,
        /// New value.
        value: StateValue,
    },

    /// A statistic sample was recorded.
    StatisticRecorded {
        /// Statistic label, e.g. `hall.temperature`.
        label: String,
        /// Sample value.
        value: f64,
        /// Aggregation bucket.
        #[serde(with = "bucket_secs")]
        bucket: Duration,
    },

    /// A command request was accepted for processing.
    CommandReceived {
        /// Gateway request id.
        request_id: RequestId,
        /// Target thermostat.
        device_id: DeviceId,
    },

    /// A command completed.
    CommandDone {
        /// Gateway request id.
        request_id: RequestId,
        /// Target thermostat.
        device_id: DeviceId,
    },

    /// A command failed, was rejected or timed out.
    CommandFailed {
        /// Gateway request id.
        request_id: RequestId,
        /// Target thermostat.
        device_id: DeviceId,
        /// Message shown to the user.
        message: String,
    },
}

impl GatewayEvent {
    /// Returns the thermostat the event concerns, if any.
    ///
    /// State and statistic events are keyed by label only.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            Self::StatusPublished(report) => Some(report.device_id),
            Self::CommandReceived { device_id, .. }
            | Self::CommandDone { device_id, .. }
            | Self::CommandFailed { device_id, .. } => Some(*device_id),
            Self::StateSet { .. } | Self::StatisticRecorded { .. } => None,
        }
    }

    /// Returns `true` for the terminal events of a command.
    #[must_use]
    pub fn is_command_outcome(&self) -> bool {
        matches!(self, Self::CommandDone { .. } | Self::CommandFailed { .. })
    }
}

mod bucket_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(bucket: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(bucket.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_outcomes() {
        let id = DeviceId::new();
        let done = GatewayEvent::CommandDone {
            request_id: RequestId::new("a"),
            device_id: id,
        };
        let received = GatewayEvent::CommandReceived {
            request_id: RequestId::new("a"),
            device_id: id,
        };
        assert!(done.is_command_outcome());
        assert!(!received.is_command_outcome());
        assert_eq!(done.device_id(), Some(id));
    }

    #[test]
    fn state_events_have_no_device() {
        let event = GatewayEvent::StateSet {
            key: "thermostat.hall.humidity".to_string(),
            value: StateValue::Number(40.0),
        };
        assert_eq!(event.device_id(), None);
    }

    #[test]
    fn statistic_serializes_bucket_in_seconds() {
        let event = GatewayEvent::StatisticRecorded {
            label: "hall.temperature".to_string(),
            value: 21.0,
            bucket: Duration::from_secs(300),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "statistic_recorded");
        assert_eq!(json["bucket"], 300);
    }
}
