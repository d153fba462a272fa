// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat commands relayed from the gateway.
//!
//! The gateway sends commands as a kind string plus a parameter map. They
//! are validated into a [`ThermostatCommand`] before anything touches the
//! network; a command that fails validation is never sent.
//!
//! # Available Commands
//!
//! | Kind | Parameter `value` | Vendor update |
//! |------|-------------------|---------------|
//! | `set_mode` | `heat`, `cool`, `range`, `off` | `shared` `target_temperature_type` |
//! | `set_temperature` | setpoint in the display unit | `shared` `target_temperature` |
//! | `set_fan` | `on`, `auto` | `device` `fan_mode` |
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use nest_thermostat::command::ThermostatCommand;
//! use nest_thermostat::types::TemperatureUnit;
//!
//! let mut params = HashMap::new();
//! params.insert("value".to_string(), serde_json::json!(70));
//!
//! let cmd = ThermostatCommand::parse("set_temperature", &params).unwrap();
//! let (target, body) = cmd.vendor_update(TemperatureUnit::Fahrenheit);
//! assert_eq!(target.as_str(), "shared");
//! assert_eq!(body["target_temperature"], serde_json::json!(21.1));
//! ```

mod pending;

pub use pending::{CommandOutcome, DeviceCommandRequest, PendingCommand, RequestId};

use std::collections::HashMap;
use std::fmt;

use serde_json::{Value, json};

use crate::error::{CommandError, ValueError};
use crate::protocol::UpdateTarget;
use crate::types::{FanMode, TargetMode, TemperatureUnit, round_tenth};

/// Name of the parameter every command reads its value from.
pub const VALUE_PARAMETER: &str = "value";

/// A validated thermostat command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThermostatCommand {
    /// Change the thermostat mode.
    SetMode(TargetMode),
    /// Change the setpoint. The value is in the display unit.
    SetTemperature(f64),
    /// Change the fan mode.
    SetFan(FanMode),
}

impl ThermostatCommand {
    /// Validates a command from its kind and parameters.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Unrecognized` for unknown kinds,
    /// `CommandError::MissingParameter` when `value` is absent and
    /// `CommandError::InvalidParameter` when it cannot be parsed.
    pub fn parse(kind: &str, params: &HashMap<String, Value>) -> Result<Self, CommandError> {
        match kind {
            "set_mode" => {
                let raw = required_text(kind, params)?;
                raw.parse().map(Self::SetMode).map_err(invalid_value)
            }
            "set_temperature" => {
                let value = params
                    .get(VALUE_PARAMETER)
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| missing(kind))?;
                parse_temperature(value).map(Self::SetTemperature).map_err(invalid_value)
            }
            "set_fan" => {
                let raw = required_text(kind, params)?;
                raw.parse().map(Self::SetFan).map_err(invalid_value)
            }
            other => Err(CommandError::Unrecognized(other.to_string())),
        }
    }

    /// Returns the command kind string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetMode(_) => "set_mode",
            Self::SetTemperature(_) => "set_temperature",
            Self::SetFan(_) => "set_fan",
        }
    }

    /// Builds the vendor partial update for this command.
    ///
    /// Setpoints are converted from `unit` to °C and rounded to one decimal.
    #[must_use]
    pub fn vendor_update(&self, unit: TemperatureUnit) -> (UpdateTarget, Value) {
        match self {
            Self::SetMode(mode) => (
                UpdateTarget::Shared,
                json!({ "target_temperature_type": mode.as_str() }),
            ),
            Self::SetTemperature(value) => (
                UpdateTarget::Shared,
                json!({
                    "target_change_pending": true,
                    "target_temperature": round_tenth(unit.to_celsius(*value)),
                }),
            ),
            Self::SetFan(mode) => (UpdateTarget::Device, json!({ "fan_mode": mode.as_str() })),
        }
    }
}

impl fmt::Display for ThermostatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetMode(mode) => write!(f, "set_mode {mode}"),
            Self::SetTemperature(value) => write!(f, "set_temperature {value}"),
            Self::SetFan(mode) => write!(f, "set_fan {}", mode.as_str()),
        }
    }
}

fn missing(kind: &str) -> CommandError {
    CommandError::MissingParameter {
        command: kind.to_string(),
        parameter: VALUE_PARAMETER.to_string(),
    }
}

fn invalid_value(source: ValueError) -> CommandError {
    CommandError::InvalidParameter {
        parameter: VALUE_PARAMETER.to_string(),
        source,
    }
}

fn required_text(kind: &str, params: &HashMap<String, Value>) -> Result<String, CommandError> {
    match params.get(VALUE_PARAMETER) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(missing(kind)),
        Some(other) => Ok(other.to_string()),
    }
}

fn parse_temperature(value: &Value) -> Result<f64, ValueError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|t| t.is_finite())
        .ok_or_else(|| ValueError::InvalidTemperature(value.to_string()))
}
