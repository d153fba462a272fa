// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for thermostat state and control.
//!
//! # Types
//!
//! - [`TemperatureUnit`] - Display unit with Celsius conversions
//! - [`HvacFlags`] - Raw stage flags reported by the thermostat
//! - [`RunMode`] - Resolved heating/cooling stage
//! - [`FanState`] - Whether the fan is running
//! - [`HoldState`] - Home/away hold of the structure
//! - [`ScheduleMode`] - Configured thermostat mode
//! - [`TargetMode`] / [`FanMode`] - Values accepted by commands

mod hvac;
mod temperature;

pub use hvac::{FanMode, FanState, HoldState, HvacFlags, RunMode, ScheduleMode, TargetMode};
pub use temperature::{
    TemperatureUnit, celsius_to_fahrenheit, fahrenheit_to_celsius, round_tenth,
};
