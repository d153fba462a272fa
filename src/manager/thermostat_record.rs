// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Internal thermostat record for the module registry.

use tokio::sync::watch;

use crate::event::DeviceId;
use crate::session::AccountKey;
use crate::telemetry::{NormalizedStatus, RawStatus};

use super::thermostat_config::ThermostatConfig;

/// Internal representation of a registered thermostat.
pub(crate) struct ThermostatRecord {
    /// Gateway-side identifier.
    pub id: DeviceId,
    /// Registration input.
    pub config: ThermostatConfig,
    /// Cache key of the owning account.
    pub account: AccountKey,
    /// Structure the thermostat was last seen in.
    pub structure_id: Option<String>,
    /// Last raw vendor status.
    pub raw: Option<RawStatus>,
    /// Last translated status.
    pub status: Option<NormalizedStatus>,
    status_tx: watch::Sender<Option<NormalizedStatus>>,
}

impl ThermostatRecord {
    /// Creates a record that has not been polled yet.
    pub fn new(id: DeviceId, config: ThermostatConfig, account: AccountKey) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            id,
            config,
            account,
            structure_id: None,
            raw: None,
            status: None,
            status_tx,
        }
    }

    /// Friendly name, the vendor name or the serial.
    pub fn display_name(&self) -> &str {
        self.config
            .friendly_name
            .as_deref()
            .or_else(|| self.status.as_ref().and_then(|s| s.name.as_deref()))
            .unwrap_or(&self.config.serial)
    }

    /// Creates a watch receiver for status updates.
    pub fn watch_status(&self) -> watch::Receiver<Option<NormalizedStatus>> {
        self.status_tx.subscribe()
    }

    /// Stores a fresh status and notifies watchers.
    pub fn update(&mut self, raw: RawStatus, status: NormalizedStatus) {
        self.structure_id = Some(raw.structure_id.clone());
        self.raw = Some(raw);
        self.status = Some(status.clone());
        // Ignore send errors (no receivers)
        let _ = self.status_tx.send(Some(status));
    }
}

impl std::fmt::Debug for ThermostatRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermostatRecord")
            .field("id", &self.id)
            .field("display_name", &self.display_name())
            .field("serial", &self.config.serial)
            .field("structure_id", &self.structure_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Credentials;
    use crate::telemetry::fixtures::SNAPSHOT;
    use crate::telemetry::{Snapshot, translate};

    fn record(config: ThermostatConfig) -> ThermostatRecord {
        let account = AccountKey::derive(b"salt", &Credentials::new("joe", "pw"));
        ThermostatRecord::new(DeviceId::new(), config, account)
    }

    fn raw() -> RawStatus {
        let snapshot: Snapshot = serde_json::from_str(SNAPSHOT).unwrap();
        snapshot.status_for("09AA01AC").unwrap()
    }

    #[test]
    fn new_record_has_no_status() {
        let record = record(ThermostatConfig::new("joe", "pw", "09AA01AC", "hall"));
        assert!(record.status.is_none());
        assert!(record.watch_status().borrow().is_none());
        assert_eq!(record.display_name(), "09AA01AC");
    }

    #[test]
    fn update_notifies_watchers() {
        let mut record = record(ThermostatConfig::new("joe", "pw", "09AA01AC", "hall"));
        let rx = record.watch_status();

        let raw = raw();
        let status = translate(&raw);
        record.update(raw, status.clone());

        assert_eq!(record.structure_id.as_deref(), Some("s-1"));
        assert_eq!(rx.borrow().as_ref(), Some(&status));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn display_name_prefers_friendly_then_vendor_name() {
        let mut record = record(ThermostatConfig::new("joe", "pw", "09AA01AC", "hall"));
        let raw = raw();
        let status = translate(&raw);
        record.update(raw, status);
        assert_eq!(record.display_name(), "Hallway");

        record.config.friendly_name = Some("Upstairs".to_string());
        assert_eq!(record.display_name(), "Upstairs");
    }
}
