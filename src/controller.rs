use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, warn};

use crate::api::{CloudApi, Outcome, execute};
use crate::protocol::ZONE_SETPOINT_DEVIATION;
use crate::types::*;
use crate::zone::{Zone, ZoneRegistry, ZoneState};
use crate::{Error, Result};

type SnapshotCallback = Box<dyn Fn(&UnitState) + Send + Sync>;

pub struct UnitControllerBuilder<A: CloudApi> {
    name: String,
    api: Arc<A>,
    zones_push_master: bool,
    snapshot_callbacks: Vec<SnapshotCallback>,
}

impl<A: CloudApi> UnitControllerBuilder<A> {
    pub fn new(name: impl Into<String>, api: Arc<A>) -> Self {
        Self {
            name: name.into(),
            api,
            zones_push_master: true,
            snapshot_callbacks: Vec::new(),
        }
    }

    /// Let zone setpoints outside the zone's band move the master setpoint.
    pub fn zones_push_master(mut self, enabled: bool) -> Self {
        self.zones_push_master = enabled;
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&UnitState) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> UnitController<A> {
        UnitController {
            state: RwLock::new(UnitState {
                name: self.name.clone(),
                ..Default::default()
            }),
            zones: ZoneRegistry::new(),
            name: self.name,
            api: self.api,
            serial: OnceLock::new(),
            zones_push_master: self.zones_push_master,
            snapshot_callbacks: self.snapshot_callbacks,
        }
    }
}

/// Owns the cached unit-wide state and issues unit-wide commands.
///
/// Mutations never fail: a rejected or unreachable command leaves the last
/// known-good value in the cache and returns it.
pub struct UnitController<A: CloudApi> {
    name: String,
    api: Arc<A>,
    serial: OnceLock<String>,
    state: RwLock<UnitState>,
    zones: ZoneRegistry,
    zones_push_master: bool,
    snapshot_callbacks: Vec<SnapshotCallback>,
}

impl<A: CloudApi> UnitController<A> {
    pub fn builder(name: impl Into<String>, api: Arc<A>) -> UnitControllerBuilder<A> {
        UnitControllerBuilder::new(name, api)
    }

    /// Handshakes with the cloud and pins the unit's serial number.
    pub async fn initialize(&self, credentials: &Credentials) -> Result<String> {
        let serial = match self.api.initialize(credentials).await {
            Ok(Some(serial)) if !serial.is_empty() => serial,
            Ok(_) => {
                return Err(Error::Initialization(
                    "failed to locate device serial number".to_string(),
                ));
            }
            Err(e) => return Err(Error::Initialization(e.to_string())),
        };

        let serial = self.serial.get_or_init(|| serial).clone();
        self.write().serial_number = serial.clone();
        debug!(unit = %self.name, serial = %serial, "initialized");
        Ok(serial)
    }

    /// Pulls status from the cloud and merges it into the cache. Never fails;
    /// on error the cache is left untouched and the result is flagged.
    pub async fn refresh_status(&self) -> StatusSnapshot {
        let status = match self.api.get_status().await {
            Ok(status) => status,
            Err(e) => {
                error!(unit = %self.name, "unexpected error refreshing status: {e}");
                return self.snapshot(true);
            }
        };

        if status.api_error {
            warn!(unit = %self.name, "failed to refresh status, cloud unreachable or returned invalid data");
            return self.snapshot(true);
        }

        let merged = {
            let mut state = self.write();
            state.merge(&status);
            state.clone()
        };
        self.zones.reconcile(&merged.zone_snapshots);

        for cb in &self.snapshot_callbacks {
            cb(&merged);
        }

        StatusSnapshot {
            api_error: false,
            state: merged,
        }
    }

    pub async fn set_power(&self, on: bool) -> PowerState {
        if self.read().power_state == PowerState::Unknown {
            self.refresh_status().await;
        }

        let target = PowerState::from_bool(on);
        if self.read().power_state == target {
            return target;
        }

        let command = if on { Command::PowerOn } else { Command::PowerOff };
        self.execute_command(command, |s| s.power_state = target, |s| s.power_state)
            .await
    }

    pub async fn set_power_on(&self) -> PowerState {
        self.set_power(true).await
    }

    pub async fn set_power_off(&self) -> PowerState {
        self.set_power(false).await
    }

    pub async fn set_heat_setpoint(&self, temp: f64) -> f64 {
        self.execute_command(
            Command::HeatSetpoint(temp),
            |s| s.master_heating_set_temp = temp,
            |s| s.master_heating_set_temp,
        )
        .await
    }

    pub async fn set_cool_setpoint(&self, temp: f64) -> f64 {
        self.execute_command(
            Command::CoolSetpoint(temp),
            |s| s.master_cooling_set_temp = temp,
            |s| s.master_cooling_set_temp,
        )
        .await
    }

    /// Returns `[cool, heat]`.
    pub async fn set_heat_cool_setpoint(&self, cool: f64, heat: f64) -> [f64; 2] {
        self.execute_command(
            Command::HeatCoolSetpoint { cool, heat },
            |s| {
                s.master_cooling_set_temp = cool;
                s.master_heating_set_temp = heat;
            },
            |s| [s.master_cooling_set_temp, s.master_heating_set_temp],
        )
        .await
    }

    pub async fn set_climate_mode(&self, mode: ClimateMode) -> ClimateMode {
        if mode == ClimateMode::Unknown {
            debug!(unit = %self.name, "ignoring request for unknown climate mode");
            return self.climate_mode();
        }
        self.execute_command(Command::ClimateMode(mode), |s| s.climate_mode = mode, |s| s.climate_mode)
            .await
    }

    /// Sets the fan speed, keeping the current continuous-fan setting.
    pub async fn set_fan_mode(&self, speed: FanSpeed) -> FanMode {
        let mode = FanMode::from_speed(speed, self.read().continuous_fan_mode);
        self.execute_command(Command::FanMode(mode), |s| s.fan_mode = mode, |s| s.fan_mode)
            .await
    }

    pub async fn set_away_mode(&self, on: bool) -> bool {
        self.execute_command(Command::AwayMode(on), |s| s.away_mode = on, |s| s.away_mode)
            .await
    }

    pub async fn set_quiet_mode(&self, on: bool) -> bool {
        self.execute_command(Command::QuietMode(on), |s| s.quiet_mode = on, |s| s.quiet_mode)
            .await
    }

    /// Switches the current fan speed to its continuous or cycling variant.
    /// With no recognizable fan speed nothing is sent and the cache is refreshed.
    pub async fn set_continuous_fan_mode(&self, on: bool) -> bool {
        let speed = self.read().fan_mode.speed();
        let Some(speed) = speed else {
            error!(unit = %self.name, "no known fan speed to apply continuous mode to, refreshing state from cloud");
            self.refresh_status().await;
            return self.continuous_fan_mode();
        };

        let mode = FanMode::from_speed(speed, on);
        self.execute_command(
            Command::FanMode(mode),
            |s| {
                s.fan_mode = mode;
                s.continuous_fan_mode = on;
            },
            |s| s.continuous_fan_mode,
        )
        .await
    }

    pub async fn set_zone_enable(&self, zone_name: &str) -> Option<bool> {
        self.set_zone_enabled(zone_name, true).await
    }

    pub async fn set_zone_disable(&self, zone_name: &str) -> Option<bool> {
        self.set_zone_enabled(zone_name, false).await
    }

    async fn set_zone_enabled(&self, zone_name: &str, enabled: bool) -> Option<bool> {
        let zone = self.zones.get(zone_name)?;
        let index = zone.index();
        let result = self
            .execute_zone_command(
                &zone,
                Command::ZoneEnable { index, enabled },
                |s| s.zone_enabled = enabled,
                |s| s.zone_enabled,
            )
            .await;
        Some(result)
    }

    /// Sends an already clamped heating setpoint for one zone.
    pub async fn set_zone_heat_temp(&self, zone_name: &str, temp: f64) -> Option<f64> {
        let zone = self.zones.get(zone_name)?;
        let index = zone.index();
        let result = self
            .execute_zone_command(
                &zone,
                Command::ZoneHeatSetpoint { index, temp },
                |s| s.current_heating_set_temp = temp,
                |s| s.current_heating_set_temp,
            )
            .await;
        Some(result)
    }

    /// Sends an already clamped cooling setpoint for one zone.
    pub async fn set_zone_cool_temp(&self, zone_name: &str, temp: f64) -> Option<f64> {
        let zone = self.zones.get(zone_name)?;
        let index = zone.index();
        let result = self
            .execute_zone_command(
                &zone,
                Command::ZoneCoolSetpoint { index, temp },
                |s| s.current_cooling_set_temp = temp,
                |s| s.current_cooling_set_temp,
            )
            .await;
        Some(result)
    }

    /// Sets a zone's heating setpoint from an unclamped target, moving the
    /// master setpoint first when the target lies outside the zone's band.
    pub async fn set_zone_heat_target(&self, zone_name: &str, value: f64) -> Option<f64> {
        let zone = self.zones.get(zone_name)?;
        if self.zones_push_master {
            let state = zone.state();
            let master = if value > state.max_heat_set_point {
                Some(value)
            } else if value < state.min_heat_set_point {
                Some(value + ZONE_SETPOINT_DEVIATION)
            } else {
                None
            };
            if let Some(master) = master {
                self.set_heat_setpoint(master).await;
                self.refresh_status().await;
            }
        }
        let clamped = zone.clamp_heat_setpoint(value);
        self.set_zone_heat_temp(zone_name, clamped).await
    }

    /// Cooling counterpart of [`Self::set_zone_heat_target`].
    pub async fn set_zone_cool_target(&self, zone_name: &str, value: f64) -> Option<f64> {
        let zone = self.zones.get(zone_name)?;
        if self.zones_push_master {
            let state = zone.state();
            let master = if value > state.max_cool_set_point {
                Some(value - ZONE_SETPOINT_DEVIATION)
            } else if value < state.min_cool_set_point {
                Some(value)
            } else {
                None
            };
            if let Some(master) = master {
                self.set_cool_setpoint(master).await;
                self.refresh_status().await;
            }
        }
        let clamped = zone.clamp_cool_setpoint(value);
        self.set_zone_cool_temp(zone_name, clamped).await
    }

    // -- Getters --

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial.get().map(String::as_str)
    }

    pub fn state(&self) -> UnitState {
        self.read().clone()
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn zone(&self, zone_name: &str) -> Option<Arc<Zone>> {
        self.zones.get(zone_name)
    }

    pub fn cloud_connected(&self) -> bool {
        self.read().cloud_connected
    }

    pub fn power_state(&self) -> PowerState {
        self.read().power_state
    }

    pub fn climate_mode(&self) -> ClimateMode {
        self.read().climate_mode
    }

    pub fn fan_mode(&self) -> FanMode {
        self.read().fan_mode
    }

    pub fn compressor_mode(&self) -> CompressorMode {
        self.read().compressor_mode
    }

    pub fn fan_running(&self) -> bool {
        self.read().fan_running
    }

    pub fn away_mode(&self) -> bool {
        self.read().away_mode
    }

    pub fn quiet_mode(&self) -> bool {
        self.read().quiet_mode
    }

    pub fn continuous_fan_mode(&self) -> bool {
        self.read().continuous_fan_mode
    }

    pub fn control_all_zones(&self) -> bool {
        self.read().control_all_zones
    }

    pub fn master_cooling_set_temp(&self) -> f64 {
        self.read().master_cooling_set_temp
    }

    pub fn master_heating_set_temp(&self) -> f64 {
        self.read().master_heating_set_temp
    }

    pub fn master_current_temp(&self) -> f64 {
        self.read().master_current_temp
    }

    pub fn master_humidity(&self) -> f64 {
        self.read().master_humidity
    }

    pub fn compressor_chasing_temp(&self) -> f64 {
        self.read().compressor_chasing_temp
    }

    pub fn compressor_current_temp(&self) -> f64 {
        self.read().compressor_current_temp
    }

    // -- Helpers --

    /// Sends `command`; caches the optimistic value only when the cloud
    /// accepted it.
    async fn execute_command<T>(
        &self,
        command: Command,
        apply: impl FnOnce(&mut UnitState),
        read: impl FnOnce(&UnitState) -> T,
    ) -> T {
        if self.send(&self.name, &command).await {
            apply(&mut *self.write());
        }
        read(&*self.read())
    }

    async fn execute_zone_command<T>(
        &self,
        zone: &Zone,
        command: Command,
        apply: impl FnOnce(&mut ZoneState),
        read: impl FnOnce(&ZoneState) -> T,
    ) -> T {
        if self.send(zone.name(), &command).await {
            zone.update_with(apply);
        }
        zone.with_state(read)
    }

    /// True when the command was accepted. A rejected command re-reads the
    /// whole unit from the cloud before returning.
    async fn send(&self, scope: &str, command: &Command) -> bool {
        match execute(&*self.api, scope, command).await {
            Outcome::Applied => true,
            Outcome::Resync => {
                self.refresh_status().await;
                false
            }
            Outcome::Unchanged => false,
        }
    }

    fn snapshot(&self, api_error: bool) -> StatusSnapshot {
        StatusSnapshot {
            api_error,
            state: self.state(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UnitState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UnitState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
