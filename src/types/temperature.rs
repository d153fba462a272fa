// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature display units and conversions.
//!
//! The vendor API always talks in degrees Celsius. The gateway may display
//! temperatures in either unit, so every value crossing the host boundary
//! goes through [`TemperatureUnit`].

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Unit used to display temperatures to the user.
///
/// # Examples
///
/// ```
/// use nest_thermostat::types::TemperatureUnit;
///
/// let unit: TemperatureUnit = "f".parse().unwrap();
/// assert_eq!(unit, TemperatureUnit::Fahrenheit);
/// assert!((unit.display_value(21.0) - 69.8).abs() < 1e-9);
/// assert!((unit.to_celsius(69.8) - 21.0).abs() < 1e-9);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[serde(rename = "c")]
    Celsius,
    /// Degrees Fahrenheit.
    #[default]
    #[serde(rename = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Returns the short code used by the gateway configuration (`c` or `f`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Celsius => "c",
            Self::Fahrenheit => "f",
        }
    }

    /// Returns the display suffix, e.g. `°F`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Converts a Celsius value into this unit.
    #[must_use]
    pub fn display_value(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    /// Converts a value expressed in this unit into Celsius.
    #[must_use]
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => fahrenheit_to_celsius(value),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(ValueError::InvalidUnit(s.to_string())),
        }
    }
}

/// Converts degrees Celsius to degrees Fahrenheit.
#[must_use]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Converts degrees Fahrenheit to degrees Celsius.
#[must_use]
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Rounds to one decimal place, the precision the thermostat accepts.
#[must_use]
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
