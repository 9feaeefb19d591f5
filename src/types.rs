use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl PowerState {
    pub fn from_bool(on: bool) -> Self {
        if on { PowerState::On } else { PowerState::Off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClimateMode {
    Auto,
    Cool,
    Heat,
    Fan,
    #[default]
    Unknown,
}

impl ClimateMode {
    /// Wire value, `None` for `Unknown` which can never be sent.
    pub fn as_actron_str(&self) -> Option<&'static str> {
        match self {
            ClimateMode::Auto => Some("AUTO"),
            ClimateMode::Cool => Some("COOL"),
            ClimateMode::Heat => Some("HEAT"),
            ClimateMode::Fan => Some("FAN"),
            ClimateMode::Unknown => None,
        }
    }

    pub fn from_actron_str(s: &str) -> Self {
        match s {
            "AUTO" => ClimateMode::Auto,
            "COOL" => ClimateMode::Cool,
            "HEAT" => ClimateMode::Heat,
            "FAN" => ClimateMode::Fan,
            _ => ClimateMode::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressorMode {
    Off,
    Heat,
    Cool,
    #[default]
    Unknown,
}

impl CompressorMode {
    pub fn from_actron_str(s: &str) -> Self {
        match s {
            "OFF" | "IDLE" => CompressorMode::Off,
            "HEAT" => CompressorMode::Heat,
            "COOL" => CompressorMode::Cool,
            _ => CompressorMode::Unknown,
        }
    }
}

/// Fan speed tier, independent of continuous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanSpeed {
    Auto,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
    AutoCont,
    LowCont,
    MediumCont,
    HighCont,
    #[default]
    Unknown,
}

impl FanMode {
    pub fn from_speed(speed: FanSpeed, continuous: bool) -> Self {
        match (speed, continuous) {
            (FanSpeed::Auto, false) => FanMode::Auto,
            (FanSpeed::Low, false) => FanMode::Low,
            (FanSpeed::Medium, false) => FanMode::Medium,
            (FanSpeed::High, false) => FanMode::High,
            (FanSpeed::Auto, true) => FanMode::AutoCont,
            (FanSpeed::Low, true) => FanMode::LowCont,
            (FanSpeed::Medium, true) => FanMode::MediumCont,
            (FanSpeed::High, true) => FanMode::HighCont,
        }
    }

    pub fn speed(&self) -> Option<FanSpeed> {
        match self {
            FanMode::Auto | FanMode::AutoCont => Some(FanSpeed::Auto),
            FanMode::Low | FanMode::LowCont => Some(FanSpeed::Low),
            FanMode::Medium | FanMode::MediumCont => Some(FanSpeed::Medium),
            FanMode::High | FanMode::HighCont => Some(FanSpeed::High),
            FanMode::Unknown => None,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            FanMode::AutoCont | FanMode::LowCont | FanMode::MediumCont | FanMode::HighCont
        )
    }

    pub fn as_actron_str(&self) -> Option<&'static str> {
        match self {
            FanMode::Auto => Some("AUTO"),
            FanMode::Low => Some("LOW"),
            FanMode::Medium => Some("MED"),
            FanMode::High => Some("HIGH"),
            FanMode::AutoCont => Some("AUTO+CONT"),
            FanMode::LowCont => Some("LOW+CONT"),
            FanMode::MediumCont => Some("MED+CONT"),
            FanMode::HighCont => Some("HIGH+CONT"),
            FanMode::Unknown => None,
        }
    }

    pub fn from_actron_str(s: &str) -> Self {
        let (base, continuous) = match s.strip_suffix("+CONT") {
            Some(base) => (base, true),
            None => (s, false),
        };
        let speed = match base {
            "AUTO" => FanSpeed::Auto,
            "LOW" => FanSpeed::Low,
            "MED" | "MEDIUM" => FanSpeed::Medium,
            "HIGH" => FanSpeed::High,
            _ => return FanMode::Unknown,
        };
        FanMode::from_speed(speed, continuous)
    }
}

/// Result of a remote command as classified by the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    /// Request reached the cloud and was rejected.
    Failure,
    /// Transport-level failure, the cloud could not be contacted.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PowerOn,
    PowerOff,
    HeatSetpoint(f64),
    CoolSetpoint(f64),
    HeatCoolSetpoint { cool: f64, heat: f64 },
    ClimateMode(ClimateMode),
    FanMode(FanMode),
    AwayMode(bool),
    QuietMode(bool),
    ZoneEnable { index: u8, enabled: bool },
    ZoneHeatSetpoint { index: u8, temp: f64 },
    ZoneCoolSetpoint { index: u8, temp: f64 },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PowerOn => write!(f, "power on"),
            Command::PowerOff => write!(f, "power off"),
            Command::HeatSetpoint(t) => write!(f, "heat setpoint {t}"),
            Command::CoolSetpoint(t) => write!(f, "cool setpoint {t}"),
            Command::HeatCoolSetpoint { cool, heat } => {
                write!(f, "heat/cool setpoint {heat}/{cool}")
            }
            Command::ClimateMode(m) => write!(f, "climate mode {m:?}"),
            Command::FanMode(m) => write!(f, "fan mode {m:?}"),
            Command::AwayMode(on) => write!(f, "away mode {on}"),
            Command::QuietMode(on) => write!(f, "quiet mode {on}"),
            Command::ZoneEnable { index, enabled } => write!(f, "zone {index} enabled {enabled}"),
            Command::ZoneHeatSetpoint { index, temp } => {
                write!(f, "zone {index} heat setpoint {temp}")
            }
            Command::ZoneCoolSetpoint { index, temp } => {
                write!(f, "zone {index} cool setpoint {temp}")
            }
        }
    }
}

/// Read-only record of one zone as reported by a status refresh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneStatus {
    pub zone_name: String,
    pub zone_index: u8,
    pub sensor_id: String,
    pub zone_enabled: bool,
    pub current_temp: f64,
    pub current_humidity: f64,
    pub current_heating_set_temp: f64,
    pub current_cooling_set_temp: f64,
    pub min_heat_set_point: f64,
    pub max_heat_set_point: f64,
    pub min_cool_set_point: f64,
    pub max_cool_set_point: f64,
    pub zone_sensor_battery: f64,
}

/// Status payload from the collaborator. Every unit field is optional and
/// merged field by field into the cache.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HvacStatus {
    pub api_error: bool,
    pub cloud_connected: Option<bool>,
    pub power_state: Option<PowerState>,
    pub climate_mode: Option<ClimateMode>,
    pub compressor_mode: Option<CompressorMode>,
    pub fan_mode: Option<FanMode>,
    pub fan_running: Option<bool>,
    pub master_cooling_set_temp: Option<f64>,
    pub master_heating_set_temp: Option<f64>,
    pub compressor_chasing_temp: Option<f64>,
    pub compressor_current_temp: Option<f64>,
    pub away_mode: Option<bool>,
    pub quiet_mode: Option<bool>,
    pub continuous_fan_mode: Option<bool>,
    pub control_all_zones: Option<bool>,
    pub master_current_temp: Option<f64>,
    pub master_current_humidity: Option<f64>,
    pub zone_current_status: Vec<ZoneStatus>,
}

impl HvacStatus {
    pub fn api_error() -> Self {
        Self {
            api_error: true,
            ..Default::default()
        }
    }
}

/// Cached unit-wide (master) state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitState {
    pub name: String,
    pub serial_number: String,
    pub cloud_connected: bool,
    pub power_state: PowerState,
    pub climate_mode: ClimateMode,
    pub fan_mode: FanMode,
    pub compressor_mode: CompressorMode,
    pub fan_running: bool,
    pub away_mode: bool,
    pub quiet_mode: bool,
    pub continuous_fan_mode: bool,
    pub control_all_zones: bool,
    pub master_cooling_set_temp: f64,
    pub master_heating_set_temp: f64,
    pub master_current_temp: f64,
    pub master_humidity: f64,
    pub compressor_chasing_temp: f64,
    pub compressor_current_temp: f64,
    #[serde(skip)]
    pub zone_snapshots: Vec<ZoneStatus>,
}

impl UnitState {
    pub(crate) fn merge(&mut self, status: &HvacStatus) {
        fn keep<T: Copy>(field: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *field = v;
            }
        }

        keep(&mut self.cloud_connected, status.cloud_connected);
        keep(&mut self.power_state, status.power_state);
        keep(&mut self.climate_mode, status.climate_mode);
        keep(&mut self.compressor_mode, status.compressor_mode);
        keep(&mut self.fan_mode, status.fan_mode);
        keep(&mut self.fan_running, status.fan_running);
        keep(&mut self.master_cooling_set_temp, status.master_cooling_set_temp);
        keep(&mut self.master_heating_set_temp, status.master_heating_set_temp);
        keep(&mut self.compressor_chasing_temp, status.compressor_chasing_temp);
        keep(&mut self.compressor_current_temp, status.compressor_current_temp);
        keep(&mut self.away_mode, status.away_mode);
        keep(&mut self.quiet_mode, status.quiet_mode);
        keep(&mut self.continuous_fan_mode, status.continuous_fan_mode);
        keep(&mut self.control_all_zones, status.control_all_zones);
        keep(&mut self.master_current_temp, status.master_current_temp);
        keep(&mut self.master_humidity, status.master_current_humidity);

        // An empty list is a partial payload, not a report of zero zones.
        if !status.zone_current_status.is_empty() {
            self.zone_snapshots = status.zone_current_status.clone();
        }
    }
}

/// Result of a status refresh: the merged cache, flagged when the cloud
/// could not supply fresh data.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub api_error: bool,
    pub state: UnitState,
}

/// Handed to the collaborator on initialization. Obtaining the token is the
/// caller's concern.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub serial: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("serial", &self.serial)
            .finish()
    }
}
