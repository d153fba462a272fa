// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The gateway-facing NEST module.
//!
//! [`NestModule`] ties everything together: it owns the thermostat
//! registry and the session cache, polls the vendor on a fixed interval,
//! relays commands and reports to the host through a
//! [`HostSink`](crate::host::HostSink).
//!
//! # Examples
//!
//! ## Polling
//!
//! ```no_run
//! use std::sync::Arc;
//! use nest_thermostat::event::EventBus;
//! use nest_thermostat::manager::{ModuleSettings, NestModule, ThermostatConfig};
//! use nest_thermostat::protocol::NestClient;
//!
//! # async fn example() -> nest_thermostat::Result<()> {
//! let module = NestModule::new(NestClient::new()?, Arc::new(EventBus::new()), ModuleSettings::new());
//! let id = module
//!     .register_device(ThermostatConfig::new("joe@example.com", "swordfish", "09AA01AC", "hall"))
//!     .await?;
//!
//! let report = module.poll_once().await;
//! println!("{} refreshed, {} failed", report.refreshed, report.failed);
//! println!("{:?}", module.get_status(id).await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Commands
//!
//! ```no_run
//! use nest_thermostat::command::{CommandOutcome, DeviceCommandRequest, RequestId};
//! # use nest_thermostat::manager::NestModule;
//! # use nest_thermostat::protocol::NestClient;
//! # use nest_thermostat::event::DeviceId;
//!
//! # async fn example(module: NestModule<NestClient>, id: DeviceId) {
//! let request = DeviceCommandRequest::new(id, RequestId::new("req-1"), "set_temperature")
//!     .with_param("value", 70);
//!
//! match module.device_command(request).await {
//!     CommandOutcome::Completed => println!("done"),
//!     CommandOutcome::TimedOut => println!("NEST did not answer"),
//!     other => println!("failed: {other:?}"),
//! }
//! # }
//! ```

mod nest_module;
mod settings;
mod thermostat_config;
mod thermostat_record;

pub use nest_module::{COMMAND_TIMEOUT_MESSAGE, DEVICE_TYPES, NestModule, PollReport};
pub use settings::{ModuleSettings, StatisticsLifetime};
pub use thermostat_config::ThermostatConfig;
