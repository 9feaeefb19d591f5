use std::sync::Arc;

use actron_hvac::{
    ClimateMode, CloudApi, CloudClient, Command, CommandResult, Credentials, Error, FanMode,
    MessageLogMode, PowerState, UnitController,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERIAL: &str = "24A1B2C3";
const STATUS_PATH: &str = "/api/v0/client/ac-systems/status/latest";
const COMMAND_PATH: &str = "/api/v0/client/ac-systems/cmds/send";

fn credentials() -> Credentials {
    Credentials {
        access_token: "token-123".to_string(),
        serial: Some(SERIAL.to_string()),
    }
}

fn status_body() -> Value {
    json!({
        "isOnline": true,
        "lastKnownState": {
            "UserAirconSettings": {
                "isOn": false,
                "Mode": "HEAT",
                "FanMode": "LOW",
                "AwayMode": false,
                "QuietMode": false,
                "TemperatureSetpoint_Cool_oC": 24.0,
                "TemperatureSetpoint_Heat_oC": 21.0,
                "EnabledZones": [true, true]
            },
            "LiveAircon": { "CompressorMode": "HEAT", "AmRunningFan": true },
            "MasterInfo": { "LiveTemp_oC": 19.2, "LiveHumidity_pc": 41.0 },
            "RemoteZoneInfo": [
                { "NV_Title": "Lounge", "LiveTemp_oC": 19.0,
                  "TemperatureSetpoint_Heat_oC": 21, "TemperatureSetpoint_Cool_oC": 24 },
                { "NV_Title": "Master", "LiveTemp_oC": 18.4,
                  "TemperatureSetpoint_Heat_oC": 20, "TemperatureSetpoint_Cool_oC": 25 }
            ]
        }
    })
}

async fn initialized_client(server: &MockServer) -> CloudClient {
    let client = CloudClient::builder(server.uri()).build().unwrap();
    client.initialize(&credentials()).await.unwrap();
    client
}

#[tokio::test]
async fn initialize_with_serial_skips_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/client/ac-systems"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = CloudClient::builder(server.uri()).build().unwrap();
    let serial = client.initialize(&credentials()).await.unwrap();
    assert_eq!(serial.as_deref(), Some(SERIAL));
    assert_eq!(client.serial().as_deref(), Some(SERIAL));
}

#[tokio::test]
async fn initialize_looks_up_serial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/client/ac-systems"))
        .and(query_param("includeNeo", "true"))
        .and(header("Authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "ac-system": [{ "serial": "LOOKED-UP", "type": "NEO" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudClient::builder(server.uri()).build().unwrap();
    let creds = Credentials {
        access_token: "token-123".to_string(),
        serial: None,
    };
    assert_eq!(
        client.initialize(&creds).await.unwrap().as_deref(),
        Some("LOOKED-UP")
    );
}

#[tokio::test]
async fn controller_initialize_fails_without_systems() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/client/ac-systems"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"ac-system": []}})),
        )
        .mount(&server)
        .await;

    let client = Arc::new(CloudClient::builder(server.uri()).build().unwrap());
    let unit = UnitController::builder("Home", client).build();
    let err = unit.initialize(&Credentials::default()).await.unwrap_err();
    assert!(
        matches!(err, Error::Initialization(_)),
        "expected Initialization, got {err:?}"
    );
}

#[tokio::test]
async fn status_before_initialize_is_error() {
    let client = CloudClient::builder("http://127.0.0.1:9").build().unwrap();
    let err = client.get_status().await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized), "got {err:?}");
}

#[tokio::test]
async fn get_status_parses_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(query_param("serial", SERIAL))
        .and(header("Authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(&server)
        .await;

    let client = initialized_client(&server).await;
    let status = client.get_status().await.unwrap();
    assert!(!status.api_error);
    assert_eq!(status.power_state, Some(PowerState::Off));
    assert_eq!(status.climate_mode, Some(ClimateMode::Heat));
    assert_eq!(status.fan_mode, Some(FanMode::Low));
    assert_eq!(status.zone_current_status.len(), 2);
    assert_eq!(status.zone_current_status[1].zone_name, "Master");
}

#[tokio::test]
async fn get_status_server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = initialized_client(&server).await;
    assert!(client.get_status().await.unwrap().api_error);
}

#[tokio::test]
async fn get_status_invalid_body_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = initialized_client(&server).await;
    assert!(client.get_status().await.unwrap().api_error);
}

#[tokio::test]
async fn run_command_sends_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .and(query_param("serial", SERIAL))
        .and(body_json(json!({
            "command": { "UserAirconSettings.QuietMode": true, "type": "set-settings" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "ack"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = initialized_client(&server).await;
    let result = client.run_command(&Command::QuietMode(true)).await.unwrap();
    assert_eq!(result, CommandResult::Success);
}

#[tokio::test]
async fn run_command_rejected_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = initialized_client(&server).await;
    let result = client.run_command(&Command::PowerOn).await.unwrap();
    assert_eq!(result, CommandResult::Failure);
}

#[tokio::test]
async fn run_command_connection_refused_is_unreachable() {
    let client = CloudClient::builder("http://127.0.0.1:1").build().unwrap();
    client.initialize(&credentials()).await.unwrap();
    let result = client.run_command(&Command::PowerOn).await.unwrap();
    assert_eq!(result, CommandResult::Unreachable);
}

#[tokio::test]
async fn run_command_unknown_mode_is_error() {
    let server = MockServer::start().await;
    let client = initialized_client(&server).await;
    let err = client
        .run_command(&Command::FanMode(FanMode::Unknown))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn controller_over_http_turns_unit_on() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .and(body_json(json!({
            "command": { "UserAirconSettings.isOn": true, "type": "set-settings" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(CloudClient::builder(server.uri()).build().unwrap());
    let unit = UnitController::builder("Home", client).build();
    assert_eq!(unit.initialize(&credentials()).await.unwrap(), SERIAL);

    assert_eq!(unit.set_power_on().await, PowerState::On);
    assert_eq!(unit.zones().len(), 2);
    assert_eq!(unit.zone("Lounge").unwrap().current_temp(), 19.0);
}

#[tokio::test]
async fn message_log_records_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let client = CloudClient::builder(server.uri())
        .message_log(MessageLogMode::Diffed, tmp.path())
        .build()
        .unwrap();
    client.initialize(&credentials()).await.unwrap();
    client.get_status().await.unwrap();
    client.get_status().await.unwrap();
    client.run_command(&Command::AwayMode(true)).await.unwrap();

    let lines: Vec<Value> = std::fs::read_to_string(tmp.path())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let dirs: Vec<&str> = lines.iter().map(|l| l["dir"].as_str().unwrap()).collect();
    assert_eq!(dirs, ["req", "status", "req", "status", "cmd", "result"]);
    assert_eq!(lines[1]["full"], true);
    assert_eq!(lines[3]["changes"].as_array().unwrap().len(), 0);
    assert_eq!(lines[4]["command"], "away mode true");
    assert_eq!(lines[5]["result"], "Success");
}
