// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-user snapshot returned by `/v2/mobile/user.<userid>`.
//!
//! The snapshot is organized in buckets keyed by thermostat serial
//! (`shared`, `device`, `link`) or by structure id (`structure`). A single
//! thermostat's status is assembled from all four with
//! [`Snapshot::status_for`].

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{HvacFlags, ScheduleMode};

/// Values shared between the thermostat and the cloud.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SharedStatus {
    /// Stage flags.
    #[serde(flatten)]
    pub hvac: HvacFlags,
    /// Measured temperature in °C.
    pub current_temperature: f64,
    /// Setpoint in °C.
    pub target_temperature: f64,
    /// Lower range setpoint in °C.
    #[serde(default)]
    pub target_temperature_low: Option<f64>,
    /// Upper range setpoint in °C.
    #[serde(default)]
    pub target_temperature_high: Option<f64>,
    /// User-assigned thermostat name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Device-local values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceStatus {
    /// Relative humidity in percent.
    #[serde(default)]
    pub current_humidity: f64,
    /// Configured mode, upper case on the wire.
    #[serde(default)]
    pub current_schedule_mode: ScheduleMode,
}

/// Structure (home) values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructureStatus {
    /// Whether the structure is in away mode.
    #[serde(default)]
    pub away: bool,
    /// Structure name, used as the thermostat's location.
    #[serde(default)]
    pub name: Option<String>,
}

/// Link from a thermostat to its structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkEntry {
    /// Structure reference, `structure.<id>`.
    pub structure: String,
}

impl LinkEntry {
    /// Returns the bare structure id.
    #[must_use]
    pub fn structure_id(&self) -> &str {
        strip_structure_prefix(&self.structure)
    }
}

fn strip_structure_prefix(reference: &str) -> &str {
    reference.strip_prefix("structure.").unwrap_or(reference)
}

/// Full per-user snapshot.
///
/// Bucket entries are kept as raw JSON and decoded one thermostat at a
/// time, so a malformed entry only fails the thermostat it belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    /// Thermostat → structure links.
    #[serde(default)]
    pub link: HashMap<String, Value>,
    /// Shared buckets by serial.
    #[serde(default)]
    pub shared: HashMap<String, Value>,
    /// Device buckets by serial.
    #[serde(default, alias = "devices")]
    pub device: HashMap<String, Value>,
    /// Structures by id.
    #[serde(default)]
    pub structure: HashMap<String, Value>,
}

impl Snapshot {
    /// Returns the serials of all thermostats in the snapshot, sorted.
    #[must_use]
    pub fn serials(&self) -> Vec<&str> {
        let mut serials: Vec<&str> = self.shared.keys().map(String::as_str).collect();
        serials.sort_unstable();
        serials
    }

    /// Assembles the raw status of one thermostat.
    ///
    /// Only this thermostat's entries are decoded.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` naming the bucket that has no
    /// entry for this thermostat, or `ParseError::InvalidValue` if one of
    /// its entries cannot be decoded.
    pub fn status_for(&self, serial: &str) -> Result<RawStatus, ParseError> {
        let shared: SharedStatus = decode_entry(&self.shared, "shared", serial)?;
        let device: DeviceStatus = decode_entry(&self.device, "device", serial)?;
        let link: LinkEntry = decode_entry(&self.link, "link", serial)?;
        let structure_id = link.structure_id();
        let structure: StructureStatus = decode_entry(&self.structure, "structure", structure_id)?;

        Ok(RawStatus {
            serial: serial.to_string(),
            structure_id: structure_id.to_string(),
            shared,
            device,
            structure,
        })
    }

    /// Returns the user-assigned name of a thermostat, if set.
    #[must_use]
    pub fn name_of(&self, serial: &str) -> Option<&str> {
        self.shared.get(serial)?.get("name")?.as_str()
    }

    /// Returns the structure name a thermostat belongs to, if known.
    #[must_use]
    pub fn location_of(&self, serial: &str) -> Option<&str> {
        let reference = self.link.get(serial)?.get("structure")?.as_str()?;
        self.structure
            .get(strip_structure_prefix(reference))?
            .get("name")?
            .as_str()
    }
}

fn decode_entry<T: DeserializeOwned>(
    bucket: &HashMap<String, Value>,
    bucket_name: &str,
    key: &str,
) -> Result<T, ParseError> {
    let value = bucket
        .get(key)
        .ok_or_else(|| ParseError::MissingField(format!("{bucket_name}.{key}")))?;
    T::deserialize(value).map_err(|e| ParseError::InvalidValue {
        field: format!("{bucket_name}.{key}"),
        message: e.to_string(),
    })
}

/// Everything the vendor reports about one thermostat.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatus {
    /// Thermostat serial.
    pub serial: String,
    /// Id of the structure it belongs to.
    pub structure_id: String,
    /// Shared bucket.
    pub shared: SharedStatus,
    /// Device bucket.
    pub device: DeviceStatus,
    /// Structure bucket.
    pub structure: StructureStatus,
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A snapshot with one thermostat heating in stage 2.
    pub(crate) const SNAPSHOT: &str = r#"{
        "link": {"09AA01AC": {"structure": "structure.s-1"}},
        "shared": {
            "09AA01AC": {
                "name": "Hallway",
                "current_temperature": 19.5,
                "target_temperature": 21.0,
                "target_temperature_low": 18.0,
                "target_temperature_high": 24.0,
                "target_temperature_type": "heat",
                "hvac_heater_state": false,
                "hvac_heat_x2_state": true,
                "hvac_heat_x3_state": false,
                "hvac_ac_state": false,
                "hvac_cool_x2_state": false,
                "hvac_cool_x3_state": false,
                "hvac_fan_state": false
            }
        },
        "device": {
            "09AA01AC": {
                "current_humidity": 41,
                "current_schedule_mode": "HEAT",
                "fan_mode": "auto"
            }
        },
        "structure": {"s-1": {"away": false, "name": "Home"}}
    }"#;
}
