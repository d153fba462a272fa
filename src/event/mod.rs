// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events the module emits towards the gateway host.
//!
//! The [`EventBus`] uses tokio's broadcast channel so any number of
//! gateway components can observe status publishes, state updates,
//! statistics and command outcomes. It implements
//! [`HostSink`](crate::host::HostSink), so it can be handed straight to
//! [`NestModule`](crate::manager::NestModule).
//!
//! # Examples
//!
//! ```
//! use nest_thermostat::host::{HostSink, StateValue};
//! use nest_thermostat::event::{EventBus, GatewayEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.set_state("thermostat.hall.humidity", StateValue::Number(40.0));
//! assert!(matches!(rx.try_recv(), Ok(GatewayEvent::StateSet { .. })));
//! ```

mod device_id;
mod event_bus;
mod gateway_event;

pub use device_id::DeviceId;
pub use event_bus::EventBus;
pub use gateway_event::GatewayEvent;
