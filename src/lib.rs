// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `nest_thermostat` - NEST thermostat support for a home automation gateway.
//!
//! This library talks to the NEST cloud on behalf of a gateway: it logs in,
//! polls thermostat status on a fixed interval and relays mode, setpoint
//! and fan commands.
//!
//! # Supported Features
//!
//! - **Sessions**: One cached login per account, refreshed shortly before
//!   it expires
//! - **Status**: Heating/cooling stage, fan, hold, schedule mode,
//!   temperatures and humidity
//! - **Commands**: `set_mode`, `set_temperature` and `set_fan`, each with a
//!   single reported outcome and a timeout
//! - **Host integration**: Status, named states and statistics pushed
//!   through a [`HostSink`](host::HostSink) or a broadcast
//!   [`EventBus`](event::EventBus)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use nest_thermostat::event::{EventBus, GatewayEvent};
//! use nest_thermostat::manager::{ModuleSettings, NestModule, ThermostatConfig};
//! use nest_thermostat::protocol::NestClient;
//!
//! #[tokio::main]
//! async fn main() -> nest_thermostat::Result<()> {
//!     let bus = EventBus::new();
//!     let mut events = bus.subscribe();
//!     let module = NestModule::new(NestClient::new()?, Arc::new(bus), ModuleSettings::new());
//!
//!     module
//!         .register_device(ThermostatConfig::new(
//!             "joe@example.com",
//!             "swordfish",
//!             "09AA01AC",
//!             "hall",
//!         ))
//!         .await?;
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let GatewayEvent::StatusPublished(report) = event {
//!             println!("{}", report.human_status);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Status Translation Only
//!
//! ```
//! use nest_thermostat::telemetry::{Snapshot, human_status, translate};
//! use nest_thermostat::types::TemperatureUnit;
//!
//! let json = r#"{
//!     "link": {"S1": {"structure": "structure.home"}},
//!     "shared": {"S1": {"current_temperature": 20.0, "target_temperature": 21.0,
//!                       "hvac_heater_state": true}},
//!     "device": {"S1": {"current_humidity": 40, "current_schedule_mode": "HEAT"}},
//!     "structure": {"home": {"away": false}}
//! }"#;
//! let snapshot: Snapshot = serde_json::from_str(json).unwrap();
//! let status = translate(&snapshot.status_for("S1").unwrap());
//!
//! assert_eq!(
//!     human_status(&status, TemperatureUnit::Celsius),
//!     "Thermostat is set to Heat, is set to 21.0°C, and is currently Heat 1. The fan is on."
//! );
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod host;
pub mod manager;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod types;

pub use command::{CommandOutcome, DeviceCommandRequest, RequestId, ThermostatCommand};
pub use error::{CommandError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{DeviceId, EventBus, GatewayEvent};
pub use host::{HostSink, StateValue, StatusReport};
pub use manager::{ModuleSettings, NestModule, PollReport, ThermostatConfig};
#[cfg(feature = "http")]
pub use protocol::{ApiConfig, NestClient};
pub use protocol::{NestApi, UpdateTarget};
pub use session::{Credentials, Session, SessionCache};
pub use telemetry::{NormalizedStatus, Snapshot, human_status, translate};
pub use types::{FanMode, FanState, HoldState, RunMode, ScheduleMode, TargetMode, TemperatureUnit};
