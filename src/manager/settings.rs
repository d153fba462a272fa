// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module-wide settings and host hints.

use std::time::Duration;

use serde::Serialize;

use crate::session::DEFAULT_REFRESH_MARGIN;
use crate::types::TemperatureUnit;

/// Settings for a [`NestModule`](super::NestModule).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use nest_thermostat::manager::ModuleSettings;
/// use nest_thermostat::types::TemperatureUnit;
///
/// let settings = ModuleSettings::new()
///     .with_poll_interval(Duration::from_secs(60))
///     .with_display_unit(TemperatureUnit::Celsius);
/// assert_eq!(settings.command_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSettings {
    /// Period between two polls of all thermostats.
    pub poll_interval: Duration,
    /// How long a command may take before it is reported as timed out.
    pub command_timeout: Duration,
    /// Sessions expiring within this window are refreshed.
    pub refresh_margin: Duration,
    /// Unit for user-facing temperatures and setpoint commands.
    pub display_unit: TemperatureUnit,
    /// Aggregation bucket for statistics.
    pub statistics_bucket: Duration,
}

impl ModuleSettings {
    /// Default poll period.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
    /// Default command timeout.
    pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);
    /// Default statistics bucket.
    pub const DEFAULT_STATISTICS_BUCKET: Duration = Duration::from_secs(5 * 60);

    /// Creates settings with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the command timeout.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the session refresh margin.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Sets the initial display unit.
    #[must_use]
    pub fn with_display_unit(mut self, unit: TemperatureUnit) -> Self {
        self.display_unit = unit;
        self
    }

    /// Sets the statistics bucket.
    #[must_use]
    pub fn with_statistics_bucket(mut self, bucket: Duration) -> Self {
        self.statistics_bucket = bucket;
        self
    }
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            command_timeout: Self::DEFAULT_COMMAND_TIMEOUT,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            display_unit: TemperatureUnit::default(),
            statistics_bucket: Self::DEFAULT_STATISTICS_BUCKET,
        }
    }
}

/// Retention, in days, the host should keep statistics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatisticsLifetime {
    /// Raw samples.
    pub full: u32,
    /// 5 minute averages.
    #[serde(rename = "5m")]
    pub five_minutes: u32,
    /// 15 minute averages.
    #[serde(rename = "15m")]
    pub fifteen_minutes: u32,
    /// Hourly averages. `0` keeps them forever.
    #[serde(rename = "60m")]
    pub hourly: u32,
}
