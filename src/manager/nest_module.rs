// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The NEST gateway module: registry, poller and command relay.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::MissedTickBehavior;

use crate::command::{
    CommandOutcome, DeviceCommandRequest, PendingCommand, RequestId, ThermostatCommand,
};
use crate::error::{CommandError, Error, ValueError};
use crate::event::DeviceId;
use crate::host::{HostSink, StateValue, StatusReport};
use crate::protocol::NestApi;
use crate::session::SessionCache;
use crate::telemetry::{NormalizedStatus, human_status, translate};
use crate::types::{TemperatureUnit, round_tenth};

use super::settings::{ModuleSettings, StatisticsLifetime};
use super::thermostat_config::ThermostatConfig;
use super::thermostat_record::ThermostatRecord;

/// Message reported to the host when a command round trip times out.
pub const COMMAND_TIMEOUT_MESSAGE: &str = "Timed out waiting for NEST; check network connection.";

/// Device types handled by this module.
pub const DEVICE_TYPES: &[&str] = &["nest_thermostat"];

const STATISTICS_PATTERN: &str = "lib.atoms.#";
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

type SharedRecord = Arc<Mutex<ThermostatRecord>>;

/// Result of one pass over all registered thermostats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Thermostats whose status was fetched and published.
    pub refreshed: usize,
    /// Thermostats whose poll failed; their records are unchanged.
    pub failed: usize,
}

/// Gateway module managing NEST thermostats.
///
/// Owns the thermostat registry and the session cache. Every poll or
/// command locks the thermostat's record for the whole vendor round trip,
/// so at most one operation per thermostat is in flight. Different
/// thermostats never wait on each other.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use nest_thermostat::event::EventBus;
/// use nest_thermostat::manager::{ModuleSettings, NestModule, ThermostatConfig};
/// use nest_thermostat::protocol::NestClient;
///
/// #[tokio::main]
/// async fn main() -> nest_thermostat::Result<()> {
///     let bus = EventBus::new();
///     let mut events = bus.subscribe();
///     let module = NestModule::new(NestClient::new()?, Arc::new(bus), ModuleSettings::new());
///
///     let config = ThermostatConfig::new("joe@example.com", "swordfish", "09AA01AC", "hall");
///     module.register_device(config).await?;
///
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("{event:?}");
///         }
///     });
///
///     module.run_until(tokio::time::sleep(Duration::from_secs(3600))).await;
///     Ok(())
/// }
/// ```
pub struct NestModule<A> {
    api: A,
    host: Arc<dyn HostSink>,
    settings: ModuleSettings,
    sessions: SessionCache,
    devices: RwLock<HashMap<DeviceId, SharedRecord>>,
    display_unit: parking_lot::RwLock<TemperatureUnit>,
    pending: parking_lot::Mutex<HashMap<RequestId, PendingCommand>>,
}

impl<A: NestApi> NestModule<A> {
    /// Creates a module talking to the vendor through `api` and reporting
    /// to `host`.
    #[must_use]
    pub fn new(api: A, host: Arc<dyn HostSink>, settings: ModuleSettings) -> Self {
        Self {
            api,
            host,
            sessions: SessionCache::with_margin(settings.refresh_margin),
            display_unit: parking_lot::RwLock::new(settings.display_unit),
            settings,
            devices: RwLock::new(HashMap::new()),
            pending: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the module settings.
    #[must_use]
    pub fn settings(&self) -> &ModuleSettings {
        &self.settings
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Registers a thermostat under a fresh id.
    ///
    /// # Errors
    ///
    /// See [`register_device_with_id`](Self::register_device_with_id).
    pub async fn register_device(&self, config: ThermostatConfig) -> Result<DeviceId, Error> {
        let device_id = DeviceId::new();
        self.register_device_with_id(device_id, config).await?;
        Ok(device_id)
    }

    /// Registers a thermostat under an id assigned by the gateway.
    ///
    /// Logs in first; nothing is registered if the login fails. The first
    /// status fetch happens right away, but a failure there only gets
    /// logged and the next poll tries again.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceAlreadyRegistered` if the id is taken,
    /// `Error::Authentication` if the vendor rejects the credentials, or
    /// the transport error if the login fails.
    pub async fn register_device_with_id(
        &self,
        device_id: DeviceId,
        config: ThermostatConfig,
    ) -> Result<(), Error> {
        if self.devices.read().await.contains_key(&device_id) {
            return Err(Error::DeviceAlreadyRegistered(device_id));
        }

        self.sessions
            .get_session(&self.api, &config.credentials)
            .await?;

        let account = self.sessions.account_key(&config.credentials);
        let record = Arc::new(Mutex::new(ThermostatRecord::new(device_id, config, account)));
        // Lock before publishing so a concurrent poll waits for the first fetch
        let mut guard = record.lock().await;
        match self.devices.write().await.entry(device_id) {
            Entry::Occupied(_) => return Err(Error::DeviceAlreadyRegistered(device_id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&record));
            }
        }

        tracing::info!(
            %device_id,
            serial = %guard.config.serial,
            name = %guard.display_name(),
            "NEST thermostat registered"
        );

        if let Err(e) = self.refresh_locked(&mut guard).await {
            tracing::warn!(
                %device_id,
                serial = %guard.config.serial,
                error = %e,
                "Initial NEST status fetch failed"
            );
        }

        Ok(())
    }

    /// Removes a thermostat.
    ///
    /// The account's session is dropped when no other thermostat uses it.
    /// Returns `true` if the thermostat was registered.
    pub async fn remove_device(&self, device_id: DeviceId) -> bool {
        let Some(record) = self.devices.write().await.remove(&device_id) else {
            return false;
        };
        let removed = record.lock().await;

        let others: Vec<SharedRecord> = self.devices.read().await.values().cloned().collect();
        let mut shared = false;
        for other in others {
            if other.lock().await.account == removed.account {
                shared = true;
                break;
            }
        }
        if !shared {
            self.sessions.invalidate(&removed.config.credentials).await;
        }

        tracing::info!(%device_id, serial = %removed.config.serial, "NEST thermostat removed");
        true
    }

    /// Returns the ids of all registered thermostats.
    pub async fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.read().await.keys().copied().collect()
    }

    /// Returns the number of registered thermostats.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Returns the last translated status of a thermostat.
    pub async fn get_status(&self, device_id: DeviceId) -> Option<NormalizedStatus> {
        let record = self.record(device_id).await?;
        record.lock().await.status.clone()
    }

    /// Creates a watch receiver for a thermostat's status.
    pub async fn watch_device(
        &self,
        device_id: DeviceId,
    ) -> Option<watch::Receiver<Option<NormalizedStatus>>> {
        let record = self.record(device_id).await?;
        Some(record.lock().await.watch_status())
    }

    async fn record(&self, device_id: DeviceId) -> Option<SharedRecord> {
        self.devices.read().await.get(&device_id).cloned()
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Fetches, translates and publishes the status of one thermostat.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for unknown ids, otherwise the
    /// login, transport or snapshot error.
    pub async fn refresh(&self, device_id: DeviceId) -> Result<NormalizedStatus, Error> {
        let record = self.record(device_id).await.ok_or(Error::DeviceNotFound)?;
        let mut record = record.lock().await;
        self.refresh_locked(&mut record).await
    }

    /// Polls every registered thermostat once.
    ///
    /// Thermostats are handled one after another; a failure is logged and
    /// counted and the pass continues with the next one.
    pub async fn poll_once(&self) -> PollReport {
        let records: Vec<SharedRecord> = self.devices.read().await.values().cloned().collect();
        let mut report = PollReport::default();

        for shared in records {
            let mut record = shared.lock().await;
            match self.refresh_locked(&mut record).await {
                Ok(_) => report.refreshed += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        device_id = %record.id,
                        serial = %record.config.serial,
                        error = %e,
                        "NEST poll failed"
                    );
                }
            }
        }

        tracing::debug!(
            refreshed = report.refreshed,
            failed = report.failed,
            "NEST poll finished"
        );
        report
    }

    /// Polls on the configured interval until `shutdown` resolves.
    ///
    /// The first poll runs immediately. A poll in progress is finished
    /// before shutdown is noticed.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.settings.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(interval_secs = period.as_secs(), "NEST poller started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
        tracing::info!("NEST poller stopped");
    }

    async fn refresh_locked(
        &self,
        record: &mut ThermostatRecord,
    ) -> Result<NormalizedStatus, Error> {
        let session = self
            .sessions
            .get_session(&self.api, &record.config.credentials)
            .await?;

        let snapshot = match self.api.fetch_snapshot(&session).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.forget_rejected_session(record, &e).await;
                return Err(e);
            }
        };
        let raw = snapshot.status_for(&record.config.serial)?;
        let status = translate(&raw);

        record.update(raw, status.clone());
        self.publish(record, &status);
        Ok(status)
    }

    async fn forget_rejected_session(&self, record: &ThermostatRecord, error: &Error) {
        if error.is_unauthorized() && self.sessions.invalidate(&record.config.credentials).await {
            tracing::info!(device_id = %record.id, "Dropped rejected NEST session");
        }
    }

    fn publish(&self, record: &ThermostatRecord, status: &NormalizedStatus) {
        let unit = self.display_unit();
        let config = &record.config;

        self.host.publish_status(StatusReport {
            device_id: record.id,
            machine_label: config.machine_label.clone(),
            human_status: human_status(status, unit),
            machine_status: status.current_temperature,
            status: status.clone(),
            unit,
        });

        let display = |celsius: f64| StateValue::Number(round_tenth(unit.display_value(celsius)));
        let prefix = config.state_prefix();
        let states = [
            ("target_temperature", display(status.target_temperature)),
            ("current_temperature", display(status.current_temperature)),
            ("humidity", StateValue::Number(status.humidity)),
            ("run_mode", status.run_mode.as_str().into()),
            ("fan_state", status.fan_state.as_str().into()),
            ("hold", status.hold.as_str().into()),
            ("schedule_mode", status.schedule_mode.as_str().into()),
        ];
        for (name, value) in states {
            self.host.set_state(&format!("{prefix}{name}"), value);
        }

        if let Some(label) = &config.statistic_label {
            let bucket = self.settings.statistics_bucket;
            let samples = [
                ("temperature", status.current_temperature),
                ("humidity", status.humidity),
                ("fan_state", status.fan_state.as_level()),
                ("run_mode", status.run_mode.as_level()),
                ("hold", status.hold.as_level()),
                ("target_temp", status.target_temperature),
                ("target_temp_low", status.target_temperature_low),
                ("target_temp_high", status.target_temperature_high),
            ];
            for (name, value) in samples {
                self.host
                    .record_statistic(&format!("{label}.{name}"), value, bucket);
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Relays a gateway command to the vendor.
    ///
    /// Invalid commands, and commands reusing the id of one still in
    /// flight, are rejected before anything is sent. Accepted
    /// commands post the update and fetch the status again to confirm it;
    /// both must finish within the command timeout. The host hears about
    /// every command exactly once, through `command_done` or
    /// `command_failed`.
    pub async fn device_command(&self, request: DeviceCommandRequest) -> CommandOutcome {
        let DeviceCommandRequest {
            device_id,
            request_id,
            command,
            params,
        } = request;

        let command = match ThermostatCommand::parse(&command, &params) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(%device_id, %request_id, error = %e, "Rejected NEST command");
                self.host
                    .command_failed(&request_id, device_id, &e.to_string());
                return CommandOutcome::Rejected(e);
            }
        };

        let Some(record) = self.record(device_id).await else {
            let message = Error::DeviceNotFound.to_string();
            tracing::warn!(%device_id, %request_id, "Command for unknown NEST thermostat");
            self.host.command_failed(&request_id, device_id, &message);
            return CommandOutcome::Failed(message);
        };

        let armed = match self.pending.lock().entry(request_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(PendingCommand::arm(request_id.clone(), device_id, command));
                true
            }
        };
        if !armed {
            let e = CommandError::DuplicateRequest(request_id.to_string());
            tracing::warn!(%device_id, %request_id, "Duplicate NEST command request");
            self.host
                .command_failed(&request_id, device_id, &e.to_string());
            return CommandOutcome::Rejected(e);
        }

        self.host.command_received(&request_id, device_id);
        tracing::debug!(%device_id, %request_id, %command, "NEST command accepted");

        let result =
            tokio::time::timeout(self.settings.command_timeout, self.relay(&record, command)).await;
        let elapsed = self
            .pending
            .lock()
            .remove(&request_id)
            .map(|pending| pending.elapsed());

        match result {
            Ok(Ok(_)) => {
                tracing::info!(%device_id, %request_id, ?elapsed, %command, "NEST command done");
                self.host.command_done(&request_id, device_id);
                CommandOutcome::Completed
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                tracing::warn!(%device_id, %request_id, error = %message, "NEST command failed");
                self.host.command_failed(&request_id, device_id, &message);
                CommandOutcome::Failed(message)
            }
            Err(_) => {
                tracing::warn!(
                    %device_id,
                    %request_id,
                    timeout_secs = self.settings.command_timeout.as_secs(),
                    "NEST command timed out"
                );
                self.host
                    .command_failed(&request_id, device_id, COMMAND_TIMEOUT_MESSAGE);
                CommandOutcome::TimedOut
            }
        }
    }

    /// Returns the commands currently waiting on the vendor.
    #[must_use]
    pub fn pending_commands(&self) -> Vec<PendingCommand> {
        self.pending.lock().values().cloned().collect()
    }

    async fn relay(
        &self,
        record: &Mutex<ThermostatRecord>,
        command: ThermostatCommand,
    ) -> Result<NormalizedStatus, Error> {
        let mut record = record.lock().await;
        let session = self
            .sessions
            .get_session(&self.api, &record.config.credentials)
            .await?;

        let (target, body) = command.vendor_update(self.display_unit());
        tracing::debug!(
            device_id = %record.id,
            serial = %record.config.serial,
            %target,
            "Posting NEST update"
        );
        if let Err(e) = self
            .api
            .post_update(&session, target, &record.config.serial, &body)
            .await
        {
            self.forget_rejected_session(&record, &e).await;
            return Err(e);
        }

        self.refresh_locked(&mut record).await
    }

    // =========================================================================
    // Configuration hooks
    // =========================================================================

    /// Returns the unit user-facing temperatures are shown in.
    #[must_use]
    pub fn display_unit(&self) -> TemperatureUnit {
        *self.display_unit.read()
    }

    /// Changes the display unit.
    pub fn set_display_unit(&self, unit: TemperatureUnit) {
        *self.display_unit.write() = unit;
        tracing::info!(unit = unit.as_str(), "NEST display unit changed");
    }

    /// Applies a gateway configuration change.
    ///
    /// Only `misc`/`temp_display` is understood; returns `Ok(false)` for
    /// anything else.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidUnit` if `temp_display` is not `c` or `f`.
    pub fn configuration_set(
        &self,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<bool, ValueError> {
        if section != "misc" || option != "temp_display" {
            return Ok(false);
        }
        self.set_display_unit(value.parse()?);
        Ok(true)
    }

    /// Returns the device types this module handles.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn device_types(&self) -> &'static [&'static str] {
        DEVICE_TYPES
    }

    /// Returns how long the host should keep this module's statistics.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn statistics_lifetimes(&self) -> HashMap<String, StatisticsLifetime> {
        HashMap::from([(
            STATISTICS_PATTERN.to_string(),
            StatisticsLifetime {
                full: 10,
                five_minutes: 30,
                fifteen_minutes: 30,
                hourly: 0,
            },
        )])
    }
}

impl<A> fmt::Debug for NestModule<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestModule")
            .field("settings", &self.settings)
            .field("sessions", &self.sessions)
            .field("display_unit", &*self.display_unit.read())
            .finish_non_exhaustive()
    }
}
