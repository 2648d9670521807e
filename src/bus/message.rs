// src/bus/message.rs - One segment of a combined I2C transfer

/// A single write or read to one 7-bit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Write { addr: u8, data: Vec<u8> },
    /// `buf` is sized by the caller and filled by the transfer.
    Read { addr: u8, buf: Vec<u8> },
}

impl Message {
    pub fn write(addr: u8, data: impl Into<Vec<u8>>) -> Self {
        Message::Write {
            addr,
            data: data.into(),
        }
    }

    pub fn read(addr: u8, len: usize) -> Self {
        Message::Read {
            addr,
            buf: vec![0; len],
        }
    }

    pub fn addr(&self) -> u8 {
        match self {
            Message::Write { addr, .. } | Message::Read { addr, .. } => *addr,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Message::Read { .. })
    }

    /// Bytes written, or bytes read once the transfer has run.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Message::Write { data, .. } => data,
            Message::Read { buf, .. } => buf,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Message::Write { data, .. } => data,
            Message::Read { buf, .. } => buf,
        }
    }
}
