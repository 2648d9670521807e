//! Device conformance scenarios.
//!
//! Each scenario drives one attached DS1621 through a [`Ds1621Client`] and
//! injects ambient temperatures through its [`SensorHandle`], checking what a
//! host driver would observe against real hardware. The `sim_harness`
//! binary runs them from the command line.

use crate::bus::{BusError, VirtualBus};
use crate::client::Ds1621Client;
use crate::codec;
use crate::device::{CONFIG_FIXED_ONE, CONFIG_THF, CONFIG_TLF, SensorHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
    #[error("Check failed: {0}")]
    Check(String),
}

fn check(condition: bool, msg: impl FnOnce() -> String) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Check(msg()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    RwTh,
    RwTl,
    Single,
    LowPrecision,
    HighPrecision,
    LowFlag,
    HighFlag,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::RwTh,
        Scenario::RwTl,
        Scenario::Single,
        Scenario::LowPrecision,
        Scenario::HighPrecision,
        Scenario::LowFlag,
        Scenario::HighFlag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::RwTh => "rw-th",
            Scenario::RwTl => "rw-tl",
            Scenario::Single => "single",
            Scenario::LowPrecision => "low-precision",
            Scenario::HighPrecision => "high-precision",
            Scenario::LowFlag => "low-flag",
            Scenario::HighFlag => "high-flag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn run(
        self,
        bus: &mut VirtualBus,
        address: u8,
        sensor: &SensorHandle,
    ) -> Result<(), ScenarioError> {
        let mut client = Ds1621Client::new(bus, address);
        match self {
            Scenario::RwTh => threshold_round_trip(&mut client, true, [0x12, 0x34]),
            Scenario::RwTl => threshold_round_trip(&mut client, false, [0x56, 0x78]),
            Scenario::Single => single_conversion(&mut client, sensor),
            Scenario::LowPrecision => low_precision(&mut client, sensor),
            Scenario::HighPrecision => high_precision(&mut client, sensor),
            Scenario::LowFlag => low_flag(&mut client, sensor),
            Scenario::HighFlag => high_flag(&mut client, sensor),
        }
    }
}

fn threshold_round_trip(
    client: &mut Ds1621Client<'_>,
    high: bool,
    bytes: [u8; 2],
) -> Result<(), ScenarioError> {
    let value = i16::from_be_bytes(bytes);
    let back = if high {
        client.write_threshold_high(value)?;
        client.read_threshold_high()?
    } else {
        client.write_threshold_low(value)?;
        client.read_threshold_low()?
    };
    check(back.to_be_bytes() == bytes, || {
        format!("wrote {:02x?}, read back {:02x?}", bytes, back.to_be_bytes())
    })
}

fn single_conversion(
    client: &mut Ds1621Client<'_>,
    sensor: &SensorHandle,
) -> Result<(), ScenarioError> {
    client.stop_conversion()?;
    sensor.set_ambient_milli(42_420);
    let before = client.read_temperature_milli()?;
    check(before != 42_500, || {
        format!("temperature {before} visible before conversion")
    })?;
    client.start_conversion()?;
    let after = client.read_temperature_milli()?;
    check(after == 42_500, || format!("expected 42500, read {after}"))?;
    client.stop_conversion()?;
    Ok(())
}

fn low_precision(client: &mut Ds1621Client<'_>, sensor: &SensorHandle) -> Result<(), ScenarioError> {
    client.start_conversion()?;
    for given in (-10_000..=10_000).step_by(500) {
        sensor.set_ambient_milli(given);
        let read = client.read_temperature_milli()?;
        check(read == given, || format!("ambient {given}, read {read}"))?;
    }
    let rounding = [
        (-200, 0),
        (-300, -500),
        (-700, -500),
        (-800, -1000),
        (200, 0),
        (300, 500),
        (700, 500),
        (800, 1000),
    ];
    for (given, expected) in rounding {
        sensor.set_ambient_milli(given);
        let read = client.read_temperature_milli()?;
        check(read == expected, || {
            format!("ambient {given}, expected {expected}, read {read}")
        })?;
    }
    client.stop_conversion()?;
    Ok(())
}

fn high_precision(client: &mut Ds1621Client<'_>, sensor: &SensorHandle) -> Result<(), ScenarioError> {
    client.start_conversion()?;
    for given in (-3_000..=3_000).step_by(10) {
        sensor.set_ambient_milli(given);
        let read = client.read_temperature_high_precision_milli()?;
        check((read - given).abs() <= 10, || {
            format!("ambient {given}, recovered {read}")
        })?;
    }
    client.stop_conversion()?;
    Ok(())
}

fn clear_flags(client: &mut Ds1621Client<'_>) -> Result<(), ScenarioError> {
    let config = client.read_config()?;
    client.write_config(config & !(CONFIG_THF | CONFIG_TLF))?;
    Ok(())
}

fn low_flag(client: &mut Ds1621Client<'_>, sensor: &SensorHandle) -> Result<(), ScenarioError> {
    client.start_conversion()?;
    sensor.set_ambient_milli(0);
    clear_flags(client)?;
    let config = client.read_config()?;
    check(config & 0x6c == CONFIG_FIXED_ONE, || {
        format!("flags not cleared, config {config:02x}")
    })?;

    client.write_threshold_low(codec::encode_milli_to_rounded_native(-10_000))?;
    let mut given = 0;
    while given > -20_000 {
        sensor.set_ambient_milli(given);
        if client.read_config()? & CONFIG_TLF != 0 {
            break;
        }
        given -= 1_000;
    }
    check(given == -10_000, || format!("TLF set at {given}"))?;
    client.stop_conversion()?;
    Ok(())
}

fn high_flag(client: &mut Ds1621Client<'_>, sensor: &SensorHandle) -> Result<(), ScenarioError> {
    client.start_conversion()?;
    sensor.set_ambient_milli(0);
    clear_flags(client)?;

    client.write_threshold_high(codec::encode_milli_to_rounded_native(50_000))?;
    let mut given = 0;
    while given < 100_000 {
        sensor.set_ambient_milli(given);
        if client.read_config()? & CONFIG_THF != 0 {
            break;
        }
        given += 1_000;
    }
    check(given == 50_000, || format!("THF set at {given}"))?;
    client.stop_conversion()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DEFAULT_AMBIENT_MILLI, Ds1621};

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::from_name("nope"), None);
    }

    #[test]
    fn test_all_scenarios_pass_in_sequence() {
        let mut bus = VirtualBus::new();
        let sensor = Ds1621::attach(&mut bus, 0x48, DEFAULT_AMBIENT_MILLI).unwrap();
        for scenario in Scenario::ALL {
            scenario
                .run(&mut bus, 0x48, &sensor)
                .unwrap_or_else(|e| panic!("{}: {e}", scenario.name()));
        }
    }

    #[test]
    fn test_missing_device_is_a_bus_error() {
        let mut bus = VirtualBus::new();
        let sensor = SensorHandle::new(DEFAULT_AMBIENT_MILLI);
        assert!(matches!(
            Scenario::RwTh.run(&mut bus, 0x48, &sensor),
            Err(ScenarioError::Bus(BusError::NoDevice(0x48)))
        ));
    }
}
