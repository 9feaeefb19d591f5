use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::debug;

use crate::types::ZoneStatus;

/// Battery percentage below which a zone sensor reports low battery.
const LOW_BATTERY_PC: f64 = 10.0;

/// Cached attributes of one zone.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneState {
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

impl ZoneState {
    fn update(&mut self, status: &ZoneStatus) {
        self.zone_index = status.zone_index;
        self.sensor_id = status.sensor_id.clone();
        self.zone_enabled = status.zone_enabled;
        self.current_temp = status.current_temp;
        self.current_humidity = status.current_humidity;
        self.current_heating_set_temp = status.current_heating_set_temp;
        self.current_cooling_set_temp = status.current_cooling_set_temp;
        self.min_heat_set_point = status.min_heat_set_point;
        self.max_heat_set_point = status.max_heat_set_point;
        self.min_cool_set_point = status.min_cool_set_point;
        self.max_cool_set_point = status.max_cool_set_point;
        self.zone_sensor_battery = status.zone_sensor_battery;
    }
}

impl From<&ZoneStatus> for ZoneState {
    fn from(status: &ZoneStatus) -> Self {
        let mut state = ZoneState {
            zone_name: status.zone_name.clone(),
            ..Default::default()
        };
        state.update(status);
        state
    }
}

/// A single zone's cached state. Zone commands are issued through
/// [`crate::UnitController`], which owns the refresh path.
pub struct Zone {
    name: String,
    state: RwLock<ZoneState>,
}

impl Zone {
    fn new(status: &ZoneStatus) -> Self {
        Self {
            name: status.zone_name.clone(),
            state: RwLock::new(ZoneState::from(status)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ZoneState {
        self.read().clone()
    }

    pub fn index(&self) -> u8 {
        self.read().zone_index
    }

    pub fn sensor_id(&self) -> String {
        self.read().sensor_id.clone()
    }

    pub fn zone_enabled(&self) -> bool {
        self.read().zone_enabled
    }

    pub fn current_temp(&self) -> f64 {
        self.read().current_temp
    }

    pub fn current_humidity(&self) -> f64 {
        self.read().current_humidity
    }

    pub fn current_heating_set_temp(&self) -> f64 {
        self.read().current_heating_set_temp
    }

    pub fn current_cooling_set_temp(&self) -> f64 {
        self.read().current_cooling_set_temp
    }

    pub fn zone_sensor_battery(&self) -> f64 {
        self.read().zone_sensor_battery
    }

    pub fn battery_low(&self) -> bool {
        self.read().zone_sensor_battery < LOW_BATTERY_PC
    }

    pub fn clamp_heat_setpoint(&self, value: f64) -> f64 {
        let state = self.read();
        clamp(value, state.min_heat_set_point, state.max_heat_set_point)
    }

    pub fn clamp_cool_setpoint(&self, value: f64) -> f64 {
        let state = self.read();
        clamp(value, state.min_cool_set_point, state.max_cool_set_point)
    }

    /// Overwrites the cache with a fresh snapshot of this zone.
    pub fn push_status_update(&self, status: &ZoneStatus) {
        self.write().update(status);
    }

    pub(crate) fn update_with(&self, f: impl FnOnce(&mut ZoneState)) {
        f(&mut self.write());
    }

    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&ZoneState) -> T) -> T {
        f(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, ZoneState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ZoneState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// All zones ever reported, keyed by name, in first-seen order.
#[derive(Default)]
pub struct ZoneRegistry {
    zones: RwLock<Vec<Arc<Zone>>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates known zones in place and registers new ones. Zones absent
    /// from `snapshots` are kept.
    pub fn reconcile(&self, snapshots: &[ZoneStatus]) {
        let mut zones = self.zones.write().unwrap_or_else(PoisonError::into_inner);
        for snapshot in snapshots {
            match zones.iter().find(|z| z.name == snapshot.zone_name) {
                Some(zone) => zone.push_status_update(snapshot),
                None => {
                    debug!(zone = %snapshot.zone_name, index = snapshot.zone_index, "registering zone");
                    zones.push(Arc::new(Zone::new(snapshot)));
                }
            }
        }
    }

    pub fn get(&self, zone_name: &str) -> Option<Arc<Zone>> {
        self.zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|z| z.name == zone_name)
            .cloned()
    }

    pub fn zones(&self) -> Vec<Arc<Zone>> {
        self.zones.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.zones.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
