#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actron_hvac::{
    ClimateMode, CloudApi, Command, CommandResult, CompressorMode, Credentials, Error, FanMode,
    HvacStatus, PowerState, Result, ZoneStatus,
};
use async_trait::async_trait;

enum Reply {
    Result(CommandResult),
    Error(String),
}

/// Scripted collaborator: serves a fixed status and queued command replies
/// (default `Success`), recording every call.
pub struct FakeApi {
    serial: Option<String>,
    status: Mutex<Option<HvacStatus>>,
    replies: Mutex<VecDeque<Reply>>,
    commands: Mutex<Vec<Command>>,
    status_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new(status: HvacStatus) -> Self {
        Self {
            serial: Some("SN-000123".to_string()),
            status: Mutex::new(Some(status)),
            replies: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn without_serial(mut self) -> Self {
        self.serial = None;
        self
    }

    pub fn set_status(&self, status: HvacStatus) {
        *self.status.lock().unwrap() = Some(status);
    }

    /// Makes `get_status` fail with an error instead of returning a payload.
    pub fn fail_status(&self) {
        *self.status.lock().unwrap() = None;
    }

    pub fn reply(&self, result: CommandResult) {
        self.replies.lock().unwrap().push_back(Reply::Result(result));
    }

    pub fn reply_error(&self, msg: &str) {
        self.replies.lock().unwrap().push_back(Reply::Error(msg.to_string()));
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn initialize(&self, _credentials: &Credentials) -> Result<Option<String>> {
        Ok(self.serial.clone())
    }

    async fn get_status(&self) -> Result<HvacStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Unexpected("status exploded".to_string()))
    }

    async fn run_command(&self, command: &Command) -> Result<CommandResult> {
        self.commands.lock().unwrap().push(command.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Result(r)) => Ok(r),
            Some(Reply::Error(msg)) => Err(Error::Unexpected(msg)),
            None => Ok(CommandResult::Success),
        }
    }
}

pub fn zone(name: &str, index: u8, temp: f64) -> ZoneStatus {
    ZoneStatus {
        zone_name: name.to_string(),
        zone_index: index,
        sensor_id: format!("S{index}"),
        zone_enabled: true,
        current_temp: temp,
        current_humidity: 45.0,
        current_heating_set_temp: 19.0,
        current_cooling_set_temp: 25.0,
        min_heat_set_point: 18.0,
        max_heat_set_point: 20.0,
        min_cool_set_point: 24.0,
        max_cool_set_point: 26.0,
        zone_sensor_battery: 90.0,
    }
}

pub fn full_status() -> HvacStatus {
    HvacStatus {
        api_error: false,
        cloud_connected: Some(true),
        power_state: Some(PowerState::Off),
        climate_mode: Some(ClimateMode::Cool),
        compressor_mode: Some(CompressorMode::Off),
        fan_mode: Some(FanMode::High),
        fan_running: Some(false),
        master_cooling_set_temp: Some(24.0),
        master_heating_set_temp: Some(20.0),
        compressor_chasing_temp: Some(23.0),
        compressor_current_temp: Some(23.4),
        away_mode: Some(false),
        quiet_mode: Some(false),
        continuous_fan_mode: Some(false),
        control_all_zones: Some(false),
        master_current_temp: Some(23.8),
        master_current_humidity: Some(50.0),
        zone_current_status: vec![zone("Living", 0, 22.0), zone("Bed", 1, 19.0)],
    }
}
