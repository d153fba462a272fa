// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests of the NEST module against a mocked vendor API.

use std::sync::Arc;
use std::time::Duration;

use nest_thermostat::command::{CommandOutcome, DeviceCommandRequest, RequestId};
use nest_thermostat::event::{EventBus, GatewayEvent};
use nest_thermostat::host::StateValue;
use nest_thermostat::manager::{
    COMMAND_TIMEOUT_MESSAGE, ModuleSettings, NestModule, PollReport, ThermostatConfig,
};
use nest_thermostat::protocol::{ApiConfig, NestClient};
use serde_json::json;
use tokio::sync::broadcast;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn snapshot(target: f64, heating: bool) -> serde_json::Value {
    json!({
        "link": {"09AA01AC": {"structure": "structure.s-1"}},
        "shared": {
            "09AA01AC": {
                "name": "Hallway",
                "current_temperature": 19.5,
                "target_temperature": target,
                "target_temperature_low": 18.0,
                "target_temperature_high": 24.0,
                "hvac_heater_state": heating,
                "hvac_fan_state": false
            }
        },
        "device": {"09AA01AC": {"current_humidity": 41, "current_schedule_mode": "HEAT"}},
        "structure": {"s-1": {"away": true, "name": "Home"}}
    })
}

async fn vendor() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "userid": "42",
            "urls": {"transport_url": server.uri()},
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    server
}

async fn mount_snapshot(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/mobile/user.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn module(
    server: &MockServer,
    settings: ModuleSettings,
) -> (NestModule<NestClient>, broadcast::Receiver<GatewayEvent>) {
    let client = ApiConfig::new()
        .with_login_url(format!("{}/user/login", server.uri()))
        .into_client()
        .unwrap();
    let bus = EventBus::new();
    let rx = bus.subscribe();
    (NestModule::new(client, Arc::new(bus), settings), rx)
}

fn hall() -> ThermostatConfig {
    ThermostatConfig::new("joe@example.com", "swordfish", "09AA01AC", "hall")
}

fn drain(rx: &mut broadcast::Receiver<GatewayEvent>) -> Vec<GatewayEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn state(events: &[GatewayEvent], wanted: &str) -> Option<StateValue> {
    events.iter().rev().find_map(|event| match event {
        GatewayEvent::StateSet { key, value } if key == wanted => Some(value.clone()),
        _ => None,
    })
}

#[tokio::test]
async fn register_and_poll_publishes_states() {
    let server = vendor().await;
    mount_snapshot(&server, snapshot(21.0, true)).await;
    let (module, mut rx) = module(&server, ModuleSettings::new());

    let id = module.register_device(hall()).await.unwrap();
    let report = module.poll_once().await;
    assert_eq!(
        report,
        PollReport {
            refreshed: 1,
            failed: 0
        }
    );

    let events = drain(&mut rx);
    assert_eq!(
        state(&events, "thermostat.hall.target_temperature"),
        Some(StateValue::Number(69.8))
    );
    assert_eq!(
        state(&events, "thermostat.hall.run_mode"),
        Some(StateValue::Text("heat-1".to_string()))
    );
    assert_eq!(
        state(&events, "thermostat.hall.hold"),
        Some(StateValue::Text("away".to_string()))
    );
    assert_eq!(
        state(&events, "thermostat.hall.fan_state"),
        Some(StateValue::Text("on".to_string()))
    );
    // No statistic label configured
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GatewayEvent::StatisticRecorded { .. }))
    );

    let status = module.get_status(id).await.unwrap();
    assert_eq!(status.name.as_deref(), Some("Hallway"));
}

#[tokio::test]
async fn set_mode_round_trip() {
    let server = vendor().await;
    mount_snapshot(&server, snapshot(21.0, false)).await;

    Mock::given(method("POST"))
        .and(path("/v2/put/shared.09AA01AC"))
        .and(body_json(json!({"target_temperature_type": "cool"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (module, mut rx) = module(&server, ModuleSettings::new());
    let id = module.register_device(hall()).await.unwrap();
    drain(&mut rx);

    let request = DeviceCommandRequest::new(id, RequestId::new("r-1"), "set_mode")
        .with_param("value", "cool");
    let outcome = module.device_command(request).await;

    assert_eq!(outcome, CommandOutcome::Completed);
    let events = drain(&mut rx);
    assert_eq!(events.iter().filter(|e| e.is_command_outcome()).count(), 1);
    assert!(matches!(events.last(), Some(GatewayEvent::CommandDone { .. })));
}

#[tokio::test]
async fn unrecognized_command_sends_nothing() {
    let server = vendor().await;
    mount_snapshot(&server, snapshot(21.0, false)).await;

    Mock::given(method("POST"))
        .and(path("/v2/put/shared.09AA01AC"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (module, _rx) = module(&server, ModuleSettings::new());
    let id = module.register_device(hall()).await.unwrap();

    let outcome = module
        .device_command(DeviceCommandRequest::new(id, RequestId::new("r-2"), "set_humidity"))
        .await;
    assert!(matches!(outcome, CommandOutcome::Rejected(_)));
}

#[tokio::test]
async fn slow_update_times_out() {
    let server = vendor().await;
    mount_snapshot(&server, snapshot(21.0, false)).await;

    Mock::given(method("POST"))
        .and(path("/v2/put/shared.09AA01AC"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let settings = ModuleSettings::new().with_command_timeout(Duration::from_millis(300));
    let (module, mut rx) = module(&server, settings);
    let id = module.register_device(hall()).await.unwrap();
    drain(&mut rx);

    let request = DeviceCommandRequest::new(id, RequestId::new("r-3"), "set_temperature")
        .with_param("value", 72);
    let outcome = module.device_command(request).await;

    assert_eq!(outcome, CommandOutcome::TimedOut);
    let events = drain(&mut rx);
    assert_eq!(events.iter().filter(|e| e.is_command_outcome()).count(), 1);
    assert!(matches!(
        events.last(),
        Some(GatewayEvent::CommandFailed { message, .. }) if message == COMMAND_TIMEOUT_MESSAGE
    ));
}

#[tokio::test]
async fn unknown_serial_fails_poll_only_for_that_thermostat() {
    let server = vendor().await;
    mount_snapshot(&server, snapshot(21.0, false)).await;
    let (module, _rx) = module(&server, ModuleSettings::new());

    module.register_device(hall()).await.unwrap();
    module
        .register_device(ThermostatConfig::new(
            "joe@example.com",
            "swordfish",
            "NOT-MINE",
            "garage",
        ))
        .await
        .unwrap();

    let report = module.poll_once().await;
    assert_eq!(
        report,
        PollReport {
            refreshed: 1,
            failed: 1
        }
    );
}

#[tokio::test]
async fn offline_neighbour_does_not_fail_the_poll() {
    let server = vendor().await;
    let mut body = snapshot(21.0, false);
    body["link"]["OFFLINE"] = json!({"structure": "structure.s-1"});
    body["shared"]["OFFLINE"] = json!({"current_temperature": null, "target_temperature": null});
    body["device"]["OFFLINE"] = json!({"current_humidity": null});
    mount_snapshot(&server, body).await;
    let (module, _rx) = module(&server, ModuleSettings::new());

    let id = module.register_device(hall()).await.unwrap();
    let report = module.poll_once().await;

    assert_eq!(
        report,
        PollReport {
            refreshed: 1,
            failed: 0
        }
    );
    assert!(module.get_status(id).await.is_some());
}

#[tokio::test]
async fn rejected_token_forces_a_new_login() {
    let server = MockServer::start().await;

    // Registration plus two polls, each after the session was dropped
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "userid": "42",
            "urls": {"transport_url": server.uri()},
            "expires_in": 3600
        })))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/mobile/user.42"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized",
            "message": "token expired"
        })))
        .mount(&server)
        .await;

    let (module, _rx) = module(&server, ModuleSettings::new());
    module.register_device(hall()).await.unwrap();

    assert_eq!(module.poll_once().await.failed, 1);
    assert_eq!(module.poll_once().await.failed, 1);
    server.verify().await;
}
