// src/client.rs - Host-side DS1621 driver over the virtual bus
use crate::bus::{BusError, VirtualBus};
use crate::codec;
use crate::device::Command;

/// Talks to one DS1621 the way a host driver does: every register access is
/// a command write followed by a separate read.
#[derive(Debug)]
pub struct Ds1621Client<'a> {
    bus: &'a mut VirtualBus,
    address: u8,
}

impl<'a> Ds1621Client<'a> {
    pub fn new(bus: &'a mut VirtualBus, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn command(&mut self, command: Command) -> Result<(), BusError> {
        self.bus.write(self.address, &[command.to_byte()])
    }

    fn read_word(&mut self, command: Command) -> Result<i16, BusError> {
        self.command(command)?;
        let bytes = self.bus.read(self.address, 2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_byte(&mut self, command: Command) -> Result<u8, BusError> {
        self.command(command)?;
        let bytes = self.bus.read(self.address, 1)?;
        Ok(bytes[0])
    }

    fn write_word(&mut self, command: Command, value: i16) -> Result<(), BusError> {
        let [msb, lsb] = value.to_be_bytes();
        self.bus.write(self.address, &[command.to_byte(), msb, lsb])
    }

    pub fn read_threshold_high(&mut self) -> Result<i16, BusError> {
        self.read_word(Command::AccessTh)
    }

    pub fn write_threshold_high(&mut self, native: i16) -> Result<(), BusError> {
        self.write_word(Command::AccessTh, native)
    }

    pub fn read_threshold_low(&mut self) -> Result<i16, BusError> {
        self.read_word(Command::AccessTl)
    }

    pub fn write_threshold_low(&mut self, native: i16) -> Result<(), BusError> {
        self.write_word(Command::AccessTl, native)
    }

    pub fn read_config(&mut self) -> Result<u8, BusError> {
        self.read_byte(Command::AccessConfig)
    }

    pub fn write_config(&mut self, value: u8) -> Result<(), BusError> {
        self.bus
            .write(self.address, &[Command::AccessConfig.to_byte(), value])
    }

    pub fn start_conversion(&mut self) -> Result<(), BusError> {
        self.command(Command::StartConvert)
    }

    pub fn stop_conversion(&mut self) -> Result<(), BusError> {
        self.command(Command::StopConvert)
    }

    pub fn read_temperature_raw(&mut self) -> Result<i16, BusError> {
        self.read_word(Command::ReadTemperature)
    }

    /// Temperature in 0.5°C resolution, as milli-degrees.
    pub fn read_temperature_milli(&mut self) -> Result<i32, BusError> {
        Ok(codec::decode_native_to_milli(self.read_temperature_raw()?))
    }

    pub fn read_counter(&mut self) -> Result<u8, BusError> {
        self.read_byte(Command::ReadCounter)
    }

    pub fn read_slope(&mut self) -> Result<u8, BusError> {
        self.read_byte(Command::ReadSlope)
    }

    /// Temperature using COUNT_REMAIN and COUNT_PER_C. The counter registers
    /// are latched by the temperature read, so the order matters.
    pub fn read_temperature_high_precision_milli(&mut self) -> Result<i32, BusError> {
        let native = self.read_temperature_raw()?;
        let counter = self.read_counter()?;
        let slope = self.read_slope()?;
        Ok(codec::recover_extended_milli(native, counter, slope))
    }
}
