mod api;
mod client;
mod controller;
mod error;
mod logger;
mod protocol;
mod types;
mod zone;

pub use api::CloudApi;
pub use client::{CloudClient, CloudClientBuilder, DEFAULT_BASE_URL};
pub use controller::{UnitController, UnitControllerBuilder};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use types::*;
pub use zone::{Zone, ZoneRegistry, ZoneState};
