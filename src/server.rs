// src/server.rs - Attaches the configured chips and serves the attribute API
use crate::bus::{BusError, VirtualBus};
use crate::config::{Config, ConfigError};
use crate::device::{Ds1621, SensorHandle};
use crate::web::api::{AppState, create_router};
use crate::web::bus_channel::spawn_bus_task;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds a bus with every configured DS1621 attached in its power-on state.
pub fn build_bus(config: &Config) -> Result<(VirtualBus, BTreeMap<u8, SensorHandle>), BusError> {
    let mut bus = VirtualBus::new();
    let mut sensors = BTreeMap::new();
    for device in &config.devices {
        let handle = Ds1621::attach(&mut bus, device.address, device.initial_temperature)?;
        tracing::info!(
            "Virtual DS1621 at 0x{:02x}, ambient {} m°C",
            device.address,
            device.initial_temperature
        );
        sensors.insert(device.address, handle);
    }
    Ok((bus, sensors))
}

/// Runs the simulator until the web server stops.
pub async fn serve(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    let (bus, sensors) = build_bus(&config)?;
    let (bus_tx, _bus_task) = spawn_bus_task(bus);
    let app = create_router(AppState::new(bus_tx, sensors));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    #[test]
    fn test_build_bus_attaches_configured_devices() {
        let config = Config {
            devices: vec![
                DeviceConfig {
                    address: 0x48,
                    initial_temperature: 21_000,
                },
                DeviceConfig {
                    address: 0x4c,
                    initial_temperature: -3_000,
                },
            ],
            ..Config::default()
        };
        let (bus, sensors) = build_bus(&config).unwrap();
        assert_eq!(bus.addresses(), vec![0x48, 0x4c]);
        assert_eq!(sensors[&0x4c].stored_temperature(), -3_000);
    }

    #[test]
    fn test_build_bus_rejects_foreign_address() {
        let config = Config {
            devices: vec![DeviceConfig {
                address: 0x20,
                initial_temperature: 0,
            }],
            ..Config::default()
        };
        assert_eq!(build_bus(&config).unwrap_err(), BusError::InvalidAddress(0x20));
    }
}
