use std::env;
use std::sync::Arc;
use std::time::Duration;

use actron_hvac::{CloudClient, Credentials, DEFAULT_BASE_URL, UnitController};

#[tokio::main]
async fn main() -> actron_hvac::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let token = args.get(1).expect("usage: monitor <access-token> [serial]");
    let credentials = Credentials {
        access_token: token.clone(),
        serial: args.get(2).cloned(),
    };
    let base_url = env::var("ACTRON_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let client = Arc::new(CloudClient::builder(base_url).build()?);
    let unit = UnitController::builder("Actron", client)
        .on_snapshot(|state| {
            println!(
                "[{}] {:?} | {:?} | fan {:?}{} | {:.1}\u{00b0}C {:.0}% | heat {:.1} cool {:.1}",
                state.name,
                state.power_state,
                state.climate_mode,
                state.fan_mode,
                if state.fan_running { " (running)" } else { "" },
                state.master_current_temp,
                state.master_humidity,
                state.master_heating_set_temp,
                state.master_cooling_set_temp,
            );
        })
        .build();

    let serial = unit.initialize(&credentials).await?;
    println!("Monitoring unit {serial}...");

    loop {
        let snapshot = unit.refresh_status().await;
        if snapshot.api_error {
            eprintln!("Status refresh failed, showing last known state");
        }
        for zone in unit.zones().zones() {
            let state = zone.state();
            println!(
                "  {:<12} {:.1}\u{00b0}C | heat {:.1} cool {:.1} | {}{}",
                state.zone_name,
                state.current_temp,
                state.current_heating_set_temp,
                state.current_cooling_set_temp,
                if state.zone_enabled { "on" } else { "off" },
                if zone.battery_low() { " | LOW BATTERY" } else { "" },
            );
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
