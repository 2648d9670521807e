//! Request and response bodies of the attribute API.

use crate::bus::Message;
use crate::device::SensorStatus;
use serde::{Deserialize, Serialize};

/// Largest read accepted in one transfer message.
pub const MAX_READ_LEN: usize = 256;

#[derive(Debug, Deserialize, Serialize)]
pub struct TemperatureRequest {
    pub milli_celsius: i32,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct TemperatureResponse {
    pub address: u8,
    pub milli_celsius: i32,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct DeviceListResponse {
    pub devices: Vec<u8>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct DeviceStatusResponse {
    pub address: u8,
    pub stored: i32,
    pub measured: i32,
    pub config: u8,
    pub output_pin_level: bool,
    pub threshold_high: i16,
    pub threshold_low: i16,
    pub converting: bool,
}

impl DeviceStatusResponse {
    pub fn new(address: u8, status: SensorStatus) -> Self {
        Self {
            address,
            stored: status.stored_temperature,
            measured: status.measured_temperature,
            config: status.config,
            output_pin_level: status.output_pin_level,
            threshold_high: status.threshold_high,
            threshold_low: status.threshold_low,
            converting: status.converting,
        }
    }
}

/// One segment of a raw transfer: `{"addr": 72, "write": [170]}` or
/// `{"addr": 72, "read": 2}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TransferMessage {
    Write { addr: u8, write: Vec<u8> },
    Read { addr: u8, read: usize },
}

impl From<TransferMessage> for Message {
    fn from(message: TransferMessage) -> Self {
        match message {
            TransferMessage::Write { addr, write } => Message::write(addr, write),
            TransferMessage::Read { addr, read } => Message::read(addr, read),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransferRequest {
    pub messages: Vec<TransferMessage>,
}

/// Bytes of each read message, in request order.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct TransferResponse {
    pub reads: Vec<Vec<u8>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
