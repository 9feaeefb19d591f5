use serde_json::{json, Map, Value};

use crate::types::*;

pub const SYSTEMS_PATH: &str = "/api/v0/client/ac-systems?includeNeo=true";
pub const STATUS_PATH: &str = "/api/v0/client/ac-systems/status/latest";
pub const COMMAND_PATH: &str = "/api/v0/client/ac-systems/cmds/send";

const COMMAND_TYPE: &str = "set-settings";

/// Zone setpoint bands extend this far from the master setpoint.
pub const ZONE_SETPOINT_DEVIATION: f64 = 2.0;

pub fn status_path(serial: &str) -> String {
    format!("{STATUS_PATH}?serial={serial}")
}

pub fn command_path(serial: &str) -> String {
    format!("{COMMAND_PATH}?serial={serial}")
}

/// Settings written by a command, as `(key, value)` pairs. `None` when the
/// command carries a mode with no wire value.
fn command_settings(command: &Command) -> Option<Vec<(String, Value)>> {
    let settings = match command {
        Command::PowerOn => vec![("UserAirconSettings.isOn".to_string(), json!(true))],
        Command::PowerOff => vec![("UserAirconSettings.isOn".to_string(), json!(false))],
        Command::HeatSetpoint(t) => vec![(
            "UserAirconSettings.TemperatureSetpoint_Heat_oC".to_string(),
            json!(t),
        )],
        Command::CoolSetpoint(t) => vec![(
            "UserAirconSettings.TemperatureSetpoint_Cool_oC".to_string(),
            json!(t),
        )],
        Command::HeatCoolSetpoint { cool, heat } => vec![
            (
                "UserAirconSettings.TemperatureSetpoint_Cool_oC".to_string(),
                json!(cool),
            ),
            (
                "UserAirconSettings.TemperatureSetpoint_Heat_oC".to_string(),
                json!(heat),
            ),
        ],
        Command::ClimateMode(mode) => vec![(
            "UserAirconSettings.Mode".to_string(),
            json!(mode.as_actron_str()?),
        )],
        Command::FanMode(mode) => vec![(
            "UserAirconSettings.FanMode".to_string(),
            json!(mode.as_actron_str()?),
        )],
        Command::AwayMode(on) => vec![("UserAirconSettings.AwayMode".to_string(), json!(on))],
        Command::QuietMode(on) => vec![("UserAirconSettings.QuietMode".to_string(), json!(on))],
        Command::ZoneEnable { index, enabled } => vec![(
            format!("UserAirconSettings.EnabledZones[{index}]"),
            json!(enabled),
        )],
        Command::ZoneHeatSetpoint { index, temp } => vec![(
            format!("RemoteZoneInfo[{index}].TemperatureSetpoint_Heat_oC"),
            json!(temp),
        )],
        Command::ZoneCoolSetpoint { index, temp } => vec![(
            format!("RemoteZoneInfo[{index}].TemperatureSetpoint_Cool_oC"),
            json!(temp),
        )],
    };
    Some(settings)
}

pub fn command_message(command: &Command) -> Option<Value> {
    let mut body: Map<String, Value> = command_settings(command)?.into_iter().collect();
    body.insert("type".to_string(), json!(COMMAND_TYPE));
    Some(json!({ "command": body }))
}

pub fn parse_serial(body: &Value) -> Option<String> {
    body.pointer("/_embedded/ac-system/0/serial")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Maps a status body onto [`HvacStatus`]. A body without `lastKnownState`
/// is flagged as an API error.
pub fn parse_status(body: &Value) -> HvacStatus {
    let Some(state) = body.get("lastKnownState").filter(|v| v.is_object()) else {
        return HvacStatus::api_error();
    };

    let settings = state.get("UserAirconSettings").unwrap_or(&Value::Null);
    let live = state.get("LiveAircon").unwrap_or(&Value::Null);
    let master = state.get("MasterInfo").unwrap_or(&Value::Null);

    let fan_mode = str_field(settings, "FanMode").map(FanMode::from_actron_str);
    let master_heat = f64_field(settings, "TemperatureSetpoint_Heat_oC");
    let master_cool = f64_field(settings, "TemperatureSetpoint_Cool_oC");

    HvacStatus {
        api_error: false,
        cloud_connected: bool_field(body, "isOnline"),
        power_state: bool_field(settings, "isOn").map(PowerState::from_bool),
        climate_mode: str_field(settings, "Mode").map(ClimateMode::from_actron_str),
        compressor_mode: str_field(live, "CompressorMode").map(CompressorMode::from_actron_str),
        fan_mode,
        fan_running: bool_field(live, "AmRunningFan"),
        master_cooling_set_temp: master_cool,
        master_heating_set_temp: master_heat,
        compressor_chasing_temp: f64_field(live, "CompressorChasingTemperature"),
        compressor_current_temp: f64_field(live, "CompressorLiveTemperature"),
        away_mode: bool_field(settings, "AwayMode"),
        quiet_mode: bool_field(settings, "QuietMode"),
        continuous_fan_mode: fan_mode
            .filter(|m| *m != FanMode::Unknown)
            .map(|m| m.is_continuous()),
        control_all_zones: bool_field(master, "ControlAllZones"),
        master_current_temp: f64_field(master, "LiveTemp_oC"),
        master_current_humidity: f64_field(master, "LiveHumidity_pc"),
        zone_current_status: parse_zones(state, master_heat, master_cool),
    }
}

fn parse_zones(state: &Value, master_heat: Option<f64>, master_cool: Option<f64>) -> Vec<ZoneStatus> {
    let Some(Value::Array(zones)) = state.get("RemoteZoneInfo") else {
        return vec![];
    };
    let enabled = state
        .pointer("/UserAirconSettings/EnabledZones")
        .and_then(|v| v.as_array());

    zones
        .iter()
        .enumerate()
        .filter(|(_, zone)| bool_field(zone, "NV_Exists").unwrap_or(true))
        .filter_map(|(idx, zone)| {
            let zone_index = u8::try_from(idx).ok()?;
            let zone_name = str_field(zone, "NV_Title")?.to_string();
            let heat = f64_field(zone, "TemperatureSetpoint_Heat_oC").unwrap_or_default();
            let cool = f64_field(zone, "TemperatureSetpoint_Cool_oC").unwrap_or_default();
            let master_heat = master_heat.unwrap_or(heat);
            let master_cool = master_cool.unwrap_or(cool);
            let (sensor_id, battery) = parse_sensor(zone);

            Some(ZoneStatus {
                zone_name,
                zone_index,
                sensor_id,
                zone_enabled: enabled
                    .and_then(|flags| flags.get(idx))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
                current_temp: f64_field(zone, "LiveTemp_oC").unwrap_or_default(),
                current_humidity: f64_field(zone, "LiveHumidity_pc").unwrap_or_default(),
                current_heating_set_temp: heat,
                current_cooling_set_temp: cool,
                min_heat_set_point: master_heat - ZONE_SETPOINT_DEVIATION,
                max_heat_set_point: master_heat,
                min_cool_set_point: master_cool,
                max_cool_set_point: master_cool + ZONE_SETPOINT_DEVIATION,
                zone_sensor_battery: battery,
            })
        })
        .collect()
}

fn parse_sensor(zone: &Value) -> (String, f64) {
    match zone.get("Sensors").and_then(|v| v.as_object()).and_then(|m| m.iter().next()) {
        Some((id, sensor)) => (
            id.clone(),
            f64_field(sensor, "Battery_pc").unwrap_or_default(),
        ),
        None => (String::new(), 0.0),
    }
}

fn bool_field(v: &Value, key: &str) -> Option<bool> {
    v.get(key).and_then(|v| v.as_bool())
}

fn f64_field(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(|v| v.as_f64())
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(|v| v.as_str())
}
