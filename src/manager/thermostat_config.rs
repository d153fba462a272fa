// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration input for a thermostat.

use serde::Deserialize;

use crate::session::Credentials;

/// Configuration of one registered thermostat.
///
/// The gateway hands device variables over as a JSON map, so the config
/// deserializes from a flat object.
///
/// # Examples
///
/// ```
/// use nest_thermostat::manager::ThermostatConfig;
///
/// let config = ThermostatConfig::new("joe@example.com", "swordfish", "09AA01AC", "hall")
///     .with_statistic_label("house.hall")
///     .with_friendly_name("Hallway");
/// assert_eq!(config.display_name(), "Hallway");
///
/// let config: ThermostatConfig = serde_json::from_str(r#"{
///     "username": "joe@example.com",
///     "password": "swordfish",
///     "serial": "09AA01AC",
///     "machine_label": "hall"
/// }"#).unwrap();
/// assert_eq!(config.display_name(), "09AA01AC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThermostatConfig {
    /// Account the thermostat belongs to.
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Vendor serial number.
    pub serial: String,
    /// Label used in state keys, `thermostat.<machine_label>.*`.
    pub machine_label: String,
    /// Prefix for statistics; none are recorded without it.
    #[serde(default, alias = "statistics_label")]
    pub statistic_label: Option<String>,
    /// Optional friendly name for logs.
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl ThermostatConfig {
    /// Creates a configuration for a thermostat on the given account.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        serial: impl Into<String>,
        machine_label: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(username, password),
            serial: serial.into(),
            machine_label: machine_label.into(),
            statistic_label: None,
            friendly_name: None,
        }
    }

    /// Enables statistics under `label`.
    #[must_use]
    pub fn with_statistic_label(mut self, label: impl Into<String>) -> Self {
        self.statistic_label = Some(label.into());
        self
    }

    /// Sets a friendly name.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Returns the friendly name if set, otherwise the serial.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.serial)
    }

    /// Returns the state key prefix, `thermostat.<machine_label>.`.
    #[must_use]
    pub fn state_prefix(&self) -> String {
        format!("thermostat.{}.", self.machine_label)
    }
}
