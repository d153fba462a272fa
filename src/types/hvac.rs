// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HVAC state types: run-mode, fan state, hold and thermostat modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The heating or cooling stage the system is currently running.
///
/// Derived from the vendor's six mutually exclusive HVAC flags, see
/// [`HvacFlags::run_mode`].
///
/// # Examples
///
/// ```
/// use nest_thermostat::types::RunMode;
///
/// assert_eq!(RunMode::Heat2.as_str(), "heat-2");
/// assert!(RunMode::Cool1.is_active());
/// assert!(!RunMode::Off.is_active());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Nothing is running.
    #[default]
    Off,
    /// First heating stage.
    #[serde(rename = "heat-1")]
    Heat1,
    /// Second heating stage.
    #[serde(rename = "heat-2")]
    Heat2,
    /// Third heating stage.
    #[serde(rename = "heat-3")]
    Heat3,
    /// First cooling stage.
    #[serde(rename = "cool-1")]
    Cool1,
    /// Second cooling stage.
    #[serde(rename = "cool-2")]
    Cool2,
    /// Third cooling stage.
    #[serde(rename = "cool-3")]
    Cool3,
}

impl RunMode {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat1 => "heat-1",
            Self::Heat2 => "heat-2",
            Self::Heat3 => "heat-3",
            Self::Cool1 => "cool-1",
            Self::Cool2 => "cool-2",
            Self::Cool3 => "cool-3",
        }
    }

    /// Returns a label suitable for the human readable summary.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Heat1 => "Heat 1",
            Self::Heat2 => "Heat 2",
            Self::Heat3 => "Heat 3",
            Self::Cool1 => "Cool 1",
            Self::Cool2 => "Cool 2",
            Self::Cool3 => "Cool 3",
        }
    }

    /// Returns the stage as a signed level for statistics: heating stages
    /// are positive, cooling stages negative, off is zero.
    #[must_use]
    pub const fn as_level(&self) -> f64 {
        match self {
            Self::Off => 0.0,
            Self::Heat1 => 1.0,
            Self::Heat2 => 2.0,
            Self::Heat3 => 3.0,
            Self::Cool1 => -1.0,
            Self::Cool2 => -2.0,
            Self::Cool3 => -3.0,
        }
    }

    /// Returns `true` if any heating or cooling stage is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the air handler fan is blowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanState {
    /// Fan is off.
    #[default]
    Off,
    /// Fan is running.
    On,
}

impl FanState {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns `1.0` when on and `0.0` when off, for statistics.
    #[must_use]
    pub const fn as_level(&self) -> f64 {
        match self {
            Self::Off => 0.0,
            Self::On => 1.0,
        }
    }
}

impl From<bool> for FanState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Occupancy hold of the structure the thermostat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldState {
    /// Somebody is home.
    #[default]
    Home,
    /// The structure is in away mode.
    Away,
}

impl HoldState {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }

    /// Returns `1.0` when away and `0.0` when home, for statistics.
    #[must_use]
    pub const fn as_level(&self) -> f64 {
        match self {
            Self::Home => 0.0,
            Self::Away => 1.0,
        }
    }
}

impl fmt::Display for HoldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mode the thermostat is configured for, as reported by the device.
///
/// The vendor reports this in upper case (`HEAT`); values this module does
/// not know about deserialize to [`ScheduleMode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Heating only.
    #[serde(alias = "HEAT")]
    Heat,
    /// Cooling only.
    #[serde(alias = "COOL")]
    Cool,
    /// Heat/cool range.
    #[serde(alias = "RANGE")]
    Range,
    /// System off.
    #[default]
    #[serde(alias = "OFF")]
    Off,
    /// Anything else the vendor may report.
    #[serde(other)]
    Unknown,
}

impl ScheduleMode {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Range => "range",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }

    /// Returns a capitalized label for the human readable summary.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Heat => "Heat",
            Self::Cool => "Cool",
            Self::Range => "Range",
            Self::Off => "Off",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mode that can be requested through a `set_mode` command.
///
/// # Examples
///
/// ```
/// use nest_thermostat::types::TargetMode;
///
/// let mode: TargetMode = "heat".parse().unwrap();
/// assert_eq!(mode.as_str(), "heat");
/// assert!("auto".parse::<TargetMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Heat only.
    Heat,
    /// Cool only.
    Cool,
    /// Heat/cool range.
    Range,
    /// System off.
    Off,
}

impl TargetMode {
    /// Returns the value sent as `target_temperature_type`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Range => "range",
            Self::Off => "off",
        }
    }
}

impl FromStr for TargetMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "range" => Ok(Self::Range),
            "off" => Ok(Self::Off),
            _ => Err(ValueError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fan mode that can be requested through a `set_fan` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    /// Run the fan continuously.
    On,
    /// Run the fan only with heating or cooling.
    Auto,
}

impl FanMode {
    /// Returns the value sent as `fan_mode`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for FanMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Self::On),
            "auto" => Ok(Self::Auto),
            _ => Err(ValueError::InvalidFanMode(s.to_string())),
        }
    }
}

/// The raw HVAC flags reported in the `shared` bucket.
///
/// At most one of the six stage flags is expected to be set. When several
/// are set, [`run_mode`](Self::run_mode) picks the first in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HvacFlags {
    /// First heating stage.
    #[serde(rename = "hvac_heater_state", default)]
    pub heater: bool,
    /// Second heating stage.
    #[serde(rename = "hvac_heat_x2_state", default)]
    pub heat_x2: bool,
    /// Third heating stage.
    #[serde(rename = "hvac_heat_x3_state", default)]
    pub heat_x3: bool,
    /// First cooling stage.
    #[serde(rename = "hvac_ac_state", default)]
    pub ac: bool,
    /// Second cooling stage.
    #[serde(rename = "hvac_cool_x2_state", default)]
    pub cool_x2: bool,
    /// Third cooling stage.
    #[serde(rename = "hvac_cool_x3_state", default)]
    pub cool_x3: bool,
    /// Fan-only flag.
    #[serde(rename = "hvac_fan_state", default)]
    pub fan: bool,
}

impl HvacFlags {
    /// Resolves the active stage.
    ///
    /// Priority: heat-3, heat-2, heat-1, cool-3, cool-2, cool-1, off.
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_thermostat::types::{HvacFlags, RunMode};
    ///
    /// let flags = HvacFlags { heat_x2: true, ..HvacFlags::default() };
    /// assert_eq!(flags.run_mode(), RunMode::Heat2);
    /// ```
    #[must_use]
    pub fn run_mode(&self) -> RunMode {
        let stages = [
            (self.heat_x3, RunMode::Heat3),
            (self.heat_x2, RunMode::Heat2),
            (self.heater, RunMode::Heat1),
            (self.cool_x3, RunMode::Cool3),
            (self.cool_x2, RunMode::Cool2),
            (self.ac, RunMode::Cool1),
        ];

        stages
            .into_iter()
            .find_map(|(set, mode)| set.then_some(mode))
            .unwrap_or(RunMode::Off)
    }

    /// The fan runs with any stage, or on its own when the fan flag is set.
    #[must_use]
    pub fn fan_state(&self) -> FanState {
        FanState::from(self.fan || self.run_mode().is_active())
    }
}
