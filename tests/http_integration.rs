// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the NEST HTTP client using wiremock.

use chrono::{Duration as TimeDelta, Utc};
use nest_thermostat::protocol::{ApiConfig, NestApi, NestClient, UpdateTarget};
use nest_thermostat::session::{Credentials, Session, SessionCache};
use nest_thermostat::{Error, ProtocolError};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT: &str = r#"{
    "link": {"09AA01AC": {"structure": "structure.s-1"}},
    "shared": {
        "09AA01AC": {
            "name": "Hallway",
            "current_temperature": 19.5,
            "target_temperature": 21.0,
            "hvac_heater_state": true
        }
    },
    "device": {"09AA01AC": {"current_humidity": 41, "current_schedule_mode": "HEAT"}},
    "structure": {"s-1": {"away": false, "name": "Home"}}
}"#;

fn client(server: &MockServer) -> NestClient {
    ApiConfig::new()
        .with_login_url(format!("{}/user/login", server.uri()))
        .into_client()
        .unwrap()
}

fn session(server: &MockServer) -> Session {
    Session {
        transport_url: server.uri(),
        access_token: "tok".to_string(),
        user_id: "42".to_string(),
        expires_at: Utc::now() + TimeDelta::hours(1),
    }
}

fn credentials() -> Credentials {
    Credentials::new("joe@example.com", "sword fish")
}

// ============================================================================
// Login
// ============================================================================

mod login {
    use super::*;

    #[tokio::test]
    async fn posts_form_and_builds_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .and(header("user-agent", ApiConfig::DEFAULT_USER_AGENT))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=joe%40example.com"))
            .and(body_string_contains("password=sword%20fish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "userid": "42",
                "urls": {"transport_url": format!("{}/", server.uri())},
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let cache = SessionCache::new();

        let session = cache.get_session(&client, &credentials()).await.unwrap();
        assert_eq!(session.transport_url, server.uri());
        assert_eq!(session.user_id, "42");
        assert_eq!(session.access_token, "tok");

        // Second lookup is served from the cache
        let again = cache.get_session(&client, &credentials()).await.unwrap();
        assert_eq!(again, session);
    }

    #[tokio::test]
    async fn vendor_error_is_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "access_denied",
                "error_description": "user not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).login(&credentials()).await.unwrap_err();
        match err {
            Error::Authentication(reason) => {
                assert!(reason.contains("access_denied"));
                assert!(reason.contains("user not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_status_is_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn rejected_login_is_not_cached() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "access_denied"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let cache = SessionCache::new();
        assert!(cache.get_session(&client, &credentials()).await.is_err());
        assert!(cache.get_session(&client, &credentials()).await.is_err());
        assert!(cache.is_empty().await);
    }
}

// ============================================================================
// Snapshot and updates
// ============================================================================

mod transport {
    use super::*;

    #[tokio::test]
    async fn snapshot_carries_auth_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/mobile/user.42"))
            .and(header("authorization", "Basic tok"))
            .and(header("x-nl-user-id", "42"))
            .and(header("x-nl-protocol-version", "1"))
            .and(header("user-agent", ApiConfig::DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(SNAPSHOT))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = client(&server)
            .fetch_snapshot(&session(&server))
            .await
            .unwrap();

        assert_eq!(snapshot.serials(), vec!["09AA01AC"]);
        assert_eq!(snapshot.location_of("09AA01AC"), Some("Home"));
        assert!(snapshot.status_for("09AA01AC").is_ok());
    }

    #[tokio::test]
    async fn server_error_is_unexpected_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/mobile/user.42"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_snapshot(&session(&server))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn expired_token_with_error_body_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/mobile/user.42"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "unauthorized",
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_snapshot(&session(&server))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedStatus { status: 401, ref reason })
                if reason == "unauthorized: token expired"
        ));
    }

    #[tokio::test]
    async fn malformed_snapshot_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/mobile/user.42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_snapshot(&session(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn update_posts_json_to_bucket() {
        let server = MockServer::start().await;
        let body = json!({"target_change_pending": true, "target_temperature": 21.1});

        Mock::given(method("POST"))
            .and(path("/v2/put/shared.09AA01AC"))
            .and(header("authorization", "Basic tok"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .post_update(&session(&server), UpdateTarget::Shared, "09AA01AC", &body)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn vendor_error_on_update() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/put/device.09AA01AC"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_value",
                "message": "fan_mode"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .post_update(
                &session(&server),
                UpdateTarget::Device,
                "09AA01AC",
                &json!({"fan_mode": "sideways"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Vendor { ref code, .. }) if code == "invalid_value"
        ));
    }
}
