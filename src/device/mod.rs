//! # DS1621 Register Engine
//!
//! Emulates the slave side of a DS1621 digital thermometer and thermostat.
//! Bytes arrive one at a time from the bus; the first byte of a write is a
//! command, the following bytes (or the bytes read afterwards) are the
//! register contents, MSB first.
//!
//! State is split in two:
//!
//! - [`Ds1621`] owns the transfer scratch (pending byte count, shift buffer,
//!   write target). Only the bus touches it, one event at a time.
//! - [`SensorHandle`] owns the register file behind a mutex. The bus path and
//!   the external temperature source both go through it, and every threshold
//!   re-evaluation happens under a single lock acquisition.
//!
//! ## Example
//!
//! ```
//! use ds1621_sim::bus::VirtualBus;
//! use ds1621_sim::device::{Command, Ds1621};
//!
//! let mut bus = VirtualBus::new();
//! let sensor = Ds1621::attach(&mut bus, 0x48, 25_000).unwrap();
//! bus.write(0x48, &[Command::START_CONVERT]).unwrap();
//! bus.write(0x48, &[Command::READ_TEMPERATURE]).unwrap();
//! assert_eq!(bus.read(0x48, 2).unwrap(), vec![0x19, 0x00]);
//! assert_eq!(sensor.measured_temperature(), 25_000);
//! ```

pub mod command;
pub mod registers;

pub use command::Command;
pub use registers::{
    CONFIG_1SHOT, CONFIG_FIXED_ONE, CONFIG_POL, CONFIG_THF, CONFIG_TLF, DEFAULT_AMBIENT_MILLI,
    RegisterRef, SensorHandle, SensorStatus,
};

use crate::bus::{BusError, I2cSlave, VirtualBus};
use crate::codec;

/// Value put on the bus when a read runs past the end of a register before
/// anything was returned. SDA idles high.
const IDLE_BYTE: u8 = 0xff;

/// One emulated DS1621 as seen from the bus.
#[derive(Debug)]
pub struct Ds1621 {
    sensor: SensorHandle,
    pending: u8,
    buffer: u16,
    write_target: RegisterRef,
    last_output: u8,
}

impl Ds1621 {
    pub fn new(initial_temperature: i32) -> Self {
        Self {
            sensor: SensorHandle::new(initial_temperature),
            pending: 0,
            buffer: 0,
            write_target: RegisterRef::None,
            last_output: IDLE_BYTE,
        }
    }

    /// DS1621 parts strap their address to `0b1001_A2A1A0`.
    pub fn is_valid_address(address: u8) -> bool {
        address >> 3 == 0b1001
    }

    /// Creates a device in its power-on state and registers it on `bus`.
    ///
    /// The returned handle is the external temperature source and output
    /// query interface for the new chip.
    pub fn attach(
        bus: &mut VirtualBus,
        address: u8,
        initial_temperature: i32,
    ) -> Result<SensorHandle, BusError> {
        if !Self::is_valid_address(address) {
            return Err(BusError::InvalidAddress(address));
        }
        let device = Ds1621::new(initial_temperature);
        let handle = device.handle();
        bus.attach(address, Box::new(device))?;
        Ok(handle)
    }

    pub fn handle(&self) -> SensorHandle {
        self.sensor.clone()
    }

    /// Bytes still expected for the command in flight.
    pub fn pending(&self) -> u8 {
        self.pending
    }

    pub fn write_target(&self) -> RegisterRef {
        self.write_target
    }

    fn begin_transfer(&mut self, len: u8, value: u16, target: RegisterRef) {
        self.pending = len;
        self.buffer = value;
        self.write_target = target;
    }

    fn reset_transfer(&mut self) {
        self.pending = 0;
        self.write_target = RegisterRef::None;
    }

    fn dispatch(&mut self, byte: u8) {
        let Some(command) = Command::from_byte(byte) else {
            tracing::debug!("Ignoring unknown command {:02x}", byte);
            self.reset_transfer();
            return;
        };
        tracing::debug!("Command {:02x} ({:?})", byte, command);

        match command {
            Command::AccessTh => {
                let th = self.sensor.lock().threshold_high;
                self.begin_transfer(command.transfer_len(), th as u16, RegisterRef::Th);
            }
            Command::AccessTl => {
                let tl = self.sensor.lock().threshold_low;
                self.begin_transfer(command.transfer_len(), tl as u16, RegisterRef::Tl);
            }
            Command::AccessConfig => {
                let config = self.sensor.lock().config | CONFIG_FIXED_ONE;
                self.begin_transfer(command.transfer_len(), u16::from(config), RegisterRef::Config);
            }
            Command::ReadCounter => {
                let counter = self.sensor.lock().read_counter;
                self.begin_transfer(command.transfer_len(), u16::from(counter), RegisterRef::None);
            }
            Command::ReadSlope => {
                let slope = self.sensor.lock().read_slope;
                self.begin_transfer(command.transfer_len(), u16::from(slope), RegisterRef::None);
            }
            Command::ReadTemperature => {
                let native = {
                    let mut registers = self.sensor.lock();
                    let (native, counter, slope) =
                        codec::extended_resolution_registers(registers.measured_temperature);
                    registers.read_counter = counter;
                    registers.read_slope = slope;
                    native
                };
                self.begin_transfer(command.transfer_len(), native as u16, RegisterRef::None);
            }
            Command::StartConvert => {
                {
                    let mut registers = self.sensor.lock();
                    let stored = registers.stored_temperature;
                    registers.reevaluate(stored);
                    if registers.config & CONFIG_1SHOT == 0 {
                        registers.converting_continuously = true;
                    }
                }
                self.reset_transfer();
            }
            Command::StopConvert => {
                self.sensor.lock().converting_continuously = false;
                self.reset_transfer();
            }
        }
    }

    fn commit(&mut self) {
        let target = std::mem::take(&mut self.write_target);
        let mut registers = self.sensor.lock();
        let threshold_changed = target.commit(&mut registers, self.buffer);
        if target != RegisterRef::None {
            tracing::debug!("  writing value {:x} to {:?}", self.buffer, target);
        }
        if threshold_changed && registers.converting_continuously {
            let measured = registers.measured_temperature;
            registers.reevaluate(measured);
        }
    }

    fn next_output(&mut self) -> u8 {
        if self.pending == 0 {
            // Past the end of the register: the line keeps the last byte.
            return self.last_output;
        }
        self.pending -= 1;
        let byte = (self.buffer >> (8 * u32::from(self.pending))) as u8;
        if self.pending == 0 {
            self.write_target = RegisterRef::None;
        }
        tracing::debug!("  returning value {:02x}", byte);
        self.last_output = byte;
        byte
    }
}

impl I2cSlave for Ds1621 {
    fn on_write_stream_start(&mut self) {
        self.reset_transfer();
    }

    fn on_byte_written(&mut self, byte: u8) {
        if self.pending == 0 {
            self.dispatch(byte);
            return;
        }
        self.buffer = (self.buffer << 8) | u16::from(byte);
        self.pending -= 1;
        if self.pending == 0 {
            self.commit();
        }
    }

    fn on_read_stream_start(&mut self) {}

    fn on_byte_requested(&mut self) -> u8 {
        self.next_output()
    }

    fn on_byte_consumed(&mut self) -> u8 {
        self.next_output()
    }

    fn on_stream_stop(&mut self) {}
}
