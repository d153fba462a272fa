// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat telemetry: the vendor snapshot and its translation.
//!
//! The poller fetches a [`Snapshot`], picks one thermostat out of it with
//! [`Snapshot::status_for`] and turns the [`RawStatus`] into a
//! [`NormalizedStatus`] with [`translate`].

mod snapshot;
mod translate;

pub use snapshot::{DeviceStatus, LinkEntry, RawStatus, SharedStatus, Snapshot, StructureStatus};
pub use translate::{NormalizedStatus, human_status, translate};

#[cfg(test)]
pub(crate) use snapshot::fixtures;
