// src/bus/mod.rs - Byte-level I2C slave interface and the virtual bus relaying to it
pub mod message;
pub mod virtual_bus;

pub use message::Message;
pub use virtual_bus::VirtualBus;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no device at address 0x{0:02x}")]
    NoDevice(u8),
    #[error("invalid address 0x{0:02x}")]
    InvalidAddress(u8),
    #[error("address 0x{0:02x} already in use")]
    AddressInUse(u8),
}

/// Slave side of an I2C transfer.
///
/// The bus calls these in the order the events happen on the wire. Address
/// matching is done by the bus before any of them is invoked, and calls for
/// one slave never overlap.
pub trait I2cSlave: Send {
    /// The master started a write to this slave.
    fn on_write_stream_start(&mut self);
    /// The master wrote one byte.
    fn on_byte_written(&mut self, byte: u8);
    /// The master started a read from this slave.
    fn on_read_stream_start(&mut self);
    /// First byte of a read.
    fn on_byte_requested(&mut self) -> u8;
    /// The previous byte reached the master; provide the next one.
    fn on_byte_consumed(&mut self) -> u8;
    /// Stop condition.
    fn on_stream_stop(&mut self);
}
