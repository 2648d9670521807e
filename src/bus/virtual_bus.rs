//! In-process I2C bus.
//!
//! Plays the master side of every transfer: each [`Message`] is turned into
//! the slave event sequence a real adapter would generate and delivered to
//! the slave registered at the message's address.
//!
//! ```text
//! write [b0 b1 ..]  ->  write_start, byte_written(b0), byte_written(b1), .., stop
//! read  n bytes     ->  read_start, byte_requested, byte_consumed x (n-1), stop
//! ```

use super::{BusError, I2cSlave, Message};
use std::collections::BTreeMap;
use std::fmt;

/// Highest 7-bit address.
pub const MAX_ADDRESS: u8 = 0x7f;

#[derive(Default)]
pub struct VirtualBus {
    slaves: BTreeMap<u8, Box<dyn I2cSlave>>,
}

impl fmt::Debug for VirtualBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualBus")
            .field("addresses", &self.addresses())
            .finish()
    }
}

impl VirtualBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `slave` to answer at `address`.
    pub fn attach(&mut self, address: u8, slave: Box<dyn I2cSlave>) -> Result<(), BusError> {
        if address > MAX_ADDRESS {
            return Err(BusError::InvalidAddress(address));
        }
        if self.slaves.contains_key(&address) {
            return Err(BusError::AddressInUse(address));
        }
        self.slaves.insert(address, slave);
        tracing::info!("Registered slave at 0x{:02x}", address);
        Ok(())
    }

    /// Removes the slave at `address`, dropping its state.
    pub fn detach(&mut self, address: u8) -> Result<(), BusError> {
        match self.slaves.remove(&address) {
            Some(_) => {
                tracing::info!("Removed slave at 0x{:02x}", address);
                Ok(())
            }
            None => Err(BusError::NoDevice(address)),
        }
    }

    pub fn addresses(&self) -> Vec<u8> {
        self.slaves.keys().copied().collect()
    }

    pub fn is_attached(&self, address: u8) -> bool {
        self.slaves.contains_key(&address)
    }

    /// Runs `messages` in order and returns how many were processed.
    ///
    /// Read buffers are filled in place. An unknown address aborts the
    /// transfer at that message; earlier messages keep their effect.
    pub fn transfer(&mut self, messages: &mut [Message]) -> Result<usize, BusError> {
        tracing::debug!("I2C virt bus xfer {} messages:", messages.len());
        for (idx, message) in messages.iter_mut().enumerate() {
            let addr = message.addr();
            let Some(slave) = self.slaves.get_mut(&addr) else {
                tracing::warn!("No slave at 0x{:02x}", addr);
                return Err(BusError::NoDevice(addr));
            };
            tracing::debug!(
                "  {}: {} {} bytes {} 0x{:02x}",
                idx,
                if message.is_read() { "read" } else { "write" },
                message.bytes().len(),
                if message.is_read() { "from" } else { "to" },
                addr
            );
            match message {
                Message::Write { data, .. } => {
                    slave.on_write_stream_start();
                    for &byte in data.iter() {
                        slave.on_byte_written(byte);
                    }
                }
                Message::Read { buf, .. } => {
                    slave.on_read_stream_start();
                    for (i, slot) in buf.iter_mut().enumerate() {
                        *slot = if i == 0 {
                            slave.on_byte_requested()
                        } else {
                            slave.on_byte_consumed()
                        };
                    }
                }
            }
            slave.on_stream_stop();
        }
        Ok(messages.len())
    }

    /// Single write message.
    pub fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        self.transfer(&mut [Message::write(addr, data)])?;
        Ok(())
    }

    /// Single read message of `len` bytes.
    pub fn read(&mut self, addr: u8, len: usize) -> Result<Vec<u8>, BusError> {
        let mut messages = [Message::read(addr, len)];
        self.transfer(&mut messages)?;
        let [message] = messages;
        Ok(message.into_bytes())
    }

    /// Write followed by a read in one combined transfer.
    pub fn write_read(&mut self, addr: u8, data: &[u8], len: usize) -> Result<Vec<u8>, BusError> {
        let mut messages = [Message::write(addr, data), Message::read(addr, len)];
        self.transfer(&mut messages)?;
        let [_, read] = messages;
        Ok(read.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        WriteStart,
        Written(u8),
        ReadStart,
        Requested,
        Consumed,
        Stop,
    }

    /// Records events and answers reads with a counter.
    struct Recorder {
        events: Arc<Mutex<Vec<Event>>>,
        next: u8,
    }

    impl Recorder {
        fn new() -> (Self, Arc<Mutex<Vec<Event>>>) {
            let events = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    events: events.clone(),
                    next: 0,
                },
                events,
            )
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl I2cSlave for Recorder {
        fn on_write_stream_start(&mut self) {
            self.push(Event::WriteStart);
        }
        fn on_byte_written(&mut self, byte: u8) {
            self.push(Event::Written(byte));
        }
        fn on_read_stream_start(&mut self) {
            self.push(Event::ReadStart);
        }
        fn on_byte_requested(&mut self) -> u8 {
            self.push(Event::Requested);
            self.next += 1;
            self.next
        }
        fn on_byte_consumed(&mut self) -> u8 {
            self.push(Event::Consumed);
            self.next += 1;
            self.next
        }
        fn on_stream_stop(&mut self) {
            self.push(Event::Stop);
        }
    }

    #[test]
    fn test_write_event_sequence() {
        let mut bus = VirtualBus::new();
        let (slave, events) = Recorder::new();
        bus.attach(0x10, Box::new(slave)).unwrap();
        bus.write(0x10, &[0xaa, 0x55]).unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::WriteStart, Event::Written(0xaa), Event::Written(0x55), Event::Stop]
        );
    }

    #[test]
    fn test_read_event_sequence() {
        let mut bus = VirtualBus::new();
        let (slave, events) = Recorder::new();
        bus.attach(0x10, Box::new(slave)).unwrap();
        assert_eq!(bus.read(0x10, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Event::ReadStart,
                Event::Requested,
                Event::Consumed,
                Event::Consumed,
                Event::Stop
            ]
        );
    }

    #[test]
    fn test_zero_length_messages_still_frame() {
        let mut bus = VirtualBus::new();
        let (slave, events) = Recorder::new();
        bus.attach(0x10, Box::new(slave)).unwrap();
        bus.write(0x10, &[]).unwrap();
        assert!(bus.read(0x10, 0).unwrap().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::WriteStart, Event::Stop, Event::ReadStart, Event::Stop]
        );
    }

    #[test]
    fn test_attach_rules() {
        let mut bus = VirtualBus::new();
        let (a, _) = Recorder::new();
        let (b, _) = Recorder::new();
        let (c, _) = Recorder::new();
        assert_eq!(bus.attach(0x80, Box::new(a)), Err(BusError::InvalidAddress(0x80)));
        bus.attach(0x20, Box::new(b)).unwrap();
        assert_eq!(bus.attach(0x20, Box::new(c)), Err(BusError::AddressInUse(0x20)));
        assert_eq!(bus.addresses(), vec![0x20]);
        bus.detach(0x20).unwrap();
        assert!(!bus.is_attached(0x20));
        assert_eq!(bus.detach(0x20), Err(BusError::NoDevice(0x20)));
    }

    #[test]
    fn test_unknown_address_aborts_remaining_messages() {
        let mut bus = VirtualBus::new();
        let (slave, events) = Recorder::new();
        bus.attach(0x10, Box::new(slave)).unwrap();
        let mut messages = [
            Message::write(0x10, vec![1]),
            Message::write(0x11, vec![2]),
            Message::write(0x10, vec![3]),
        ];
        assert_eq!(bus.transfer(&mut messages), Err(BusError::NoDevice(0x11)));
        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::WriteStart, Event::Written(1), Event::Stop]
        );
    }
}
