// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of raw vendor status into the normalized thermostat status.

use serde::{Deserialize, Serialize};

use crate::telemetry::RawStatus;
use crate::types::{
    FanState, HoldState, RunMode, ScheduleMode, TemperatureUnit, round_tenth,
};

/// Normalized thermostat status. Temperatures are in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatus {
    /// Active heating/cooling stage.
    pub run_mode: RunMode,
    /// Whether the fan is running.
    pub fan_state: FanState,
    /// Home/away hold.
    pub hold: HoldState,
    /// Configured thermostat mode.
    pub schedule_mode: ScheduleMode,
    /// Measured temperature.
    pub current_temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Setpoint.
    pub target_temperature: f64,
    /// Lower range setpoint.
    pub target_temperature_low: f64,
    /// Upper range setpoint.
    pub target_temperature_high: f64,
    /// Thermostat name, if set.
    pub name: Option<String>,
}

/// Translates a raw vendor status.
///
/// Pure and deterministic. When the vendor omits the range setpoints both
/// fall back to the single setpoint.
///
/// # Examples
///
/// ```
/// use nest_thermostat::telemetry::{Snapshot, translate};
/// use nest_thermostat::types::{FanState, RunMode};
///
/// let json = r#"{
///     "link": {"S1": {"structure": "structure.home"}},
///     "shared": {"S1": {"current_temperature": 20.0, "target_temperature": 21.0,
///                       "hvac_ac_state": true}},
///     "device": {"S1": {"current_humidity": 40}},
///     "structure": {"home": {"away": false}}
/// }"#;
/// let snapshot: Snapshot = serde_json::from_str(json).unwrap();
/// let status = translate(&snapshot.status_for("S1").unwrap());
///
/// assert_eq!(status.run_mode, RunMode::Cool1);
/// assert_eq!(status.fan_state, FanState::On);
/// ```
#[must_use]
pub fn translate(raw: &RawStatus) -> NormalizedStatus {
    let shared = &raw.shared;
    let target = shared.target_temperature;

    NormalizedStatus {
        run_mode: shared.hvac.run_mode(),
        fan_state: shared.hvac.fan_state(),
        hold: if raw.structure.away {
            HoldState::Away
        } else {
            HoldState::Home
        },
        schedule_mode: raw.device.current_schedule_mode,
        current_temperature: shared.current_temperature,
        humidity: raw.device.current_humidity,
        target_temperature: target,
        target_temperature_low: shared.target_temperature_low.unwrap_or(target),
        target_temperature_high: shared.target_temperature_high.unwrap_or(target),
        name: shared.name.clone(),
    }
}

/// Renders the one-line summary shown to users.
///
/// The setpoint is converted to `unit` and printed with one decimal.
#[must_use]
pub fn human_status(status: &NormalizedStatus, unit: TemperatureUnit) -> String {
    let setpoint = round_tenth(unit.display_value(status.target_temperature));
    format!(
        "Thermostat is set to {}, is set to {:.1}{}, and is currently {}. The fan is {}.",
        status.schedule_mode.label(),
        setpoint,
        unit.symbol(),
        status.run_mode.label(),
        status.fan_state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Snapshot;
    use crate::telemetry::fixtures::SNAPSHOT;

    fn raw() -> RawStatus {
        let snapshot: Snapshot = serde_json::from_str(SNAPSHOT).unwrap();
        snapshot.status_for("09AA01AC").unwrap()
    }

    #[test]
    fn heat_two_alone_runs_fan() {
        let status = translate(&raw());
        assert_eq!(status.run_mode, RunMode::Heat2);
        assert_eq!(status.fan_state, FanState::On);
    }

    #[test]
    fn scalar_readings_carried_over() {
        let status = translate(&raw());
        assert!((status.current_temperature - 19.5).abs() < f64::EPSILON);
        assert!((status.humidity - 41.0).abs() < f64::EPSILON);
        assert!((status.target_temperature - 21.0).abs() < f64::EPSILON);
        assert!((status.target_temperature_low - 18.0).abs() < f64::EPSILON);
        assert!((status.target_temperature_high - 24.0).abs() < f64::EPSILON);
        assert_eq!(status.name.as_deref(), Some("Hallway"));
        assert_eq!(status.schedule_mode, ScheduleMode::Heat);
    }

    #[test]
    fn away_structure_sets_hold() {
        let mut raw = raw();
        assert_eq!(translate(&raw).hold, HoldState::Home);
        raw.structure.away = true;
        assert_eq!(translate(&raw).hold, HoldState::Away);
    }

    #[test]
    fn range_falls_back_to_setpoint() {
        let mut raw = raw();
        raw.shared.target_temperature_low = None;
        raw.shared.target_temperature_high = None;
        let status = translate(&raw);
        assert!((status.target_temperature_low - 21.0).abs() < f64::EPSILON);
        assert!((status.target_temperature_high - 21.0).abs() < f64::EPSILON);
    }

    #[test]
    fn translate_is_deterministic() {
        let raw = raw();
        assert_eq!(translate(&raw), translate(&raw));
    }

    #[test]
    fn human_status_in_fahrenheit() {
        let status = translate(&raw());
        assert_eq!(
            human_status(&status, TemperatureUnit::Fahrenheit),
            "Thermostat is set to Heat, is set to 69.8°F, and is currently Heat 2. The fan is on."
        );
    }

    #[test]
    fn human_status_in_celsius() {
        let mut raw = raw();
        raw.shared.hvac.heat_x2 = false;
        let status = translate(&raw);
        assert_eq!(
            human_status(&status, TemperatureUnit::Celsius),
            "Thermostat is set to Heat, is set to 21.0°C, and is currently Off. The fan is off."
        );
    }
}
