// src/device/registers.rs - Locked DS1621 register file and threshold logic
use crate::codec;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// High temperature flag, latched.
pub const CONFIG_THF: u8 = 1 << 6;
/// Low temperature flag, latched.
pub const CONFIG_TLF: u8 = 1 << 5;
/// Always reads back as 1.
pub const CONFIG_FIXED_ONE: u8 = 1 << 3;
/// Output pin polarity, 1 = active high.
pub const CONFIG_POL: u8 = 1 << 1;
/// One-shot conversion mode.
pub const CONFIG_1SHOT: u8 = 1 << 0;

/// Power-on ambient temperature in milli-degrees Celsius.
pub const DEFAULT_AMBIENT_MILLI: i32 = 21_000;

/// Register state shared between the bus event path and the external
/// temperature source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Registers {
    pub stored_temperature: i32,
    pub measured_temperature: i32,
    pub threshold_high: i16,
    pub threshold_low: i16,
    pub config: u8,
    pub output_pin_active: bool,
    pub read_counter: u8,
    pub read_slope: u8,
    pub converting_continuously: bool,
}

impl Registers {
    pub fn power_on(stored_temperature: i32) -> Self {
        Self {
            stored_temperature,
            measured_temperature: 0,
            threshold_high: 0,
            threshold_low: 0,
            config: 0,
            output_pin_active: false,
            read_counter: 0,
            read_slope: 0,
            converting_continuously: false,
        }
    }

    /// Latches a new measurement and updates the threshold flags and the
    /// output pin. Flags are only ever set here.
    pub fn reevaluate(&mut self, measured: i32) {
        self.measured_temperature = measured;
        let high = codec::decode_native_to_milli(self.threshold_high);
        let low = codec::decode_native_to_milli(self.threshold_low);
        if measured >= high {
            self.config |= CONFIG_THF;
            self.output_pin_active = true;
        }
        if measured <= low {
            self.config |= CONFIG_TLF;
        }
        if measured < low {
            self.output_pin_active = false;
        }
    }

    pub fn output_pin_level(&self) -> bool {
        if self.config & CONFIG_POL != 0 {
            self.output_pin_active
        } else {
            !self.output_pin_active
        }
    }
}

/// Register selected by the last access command, the destination of
/// bytes written after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterRef {
    #[default]
    None,
    Th,
    Tl,
    Config,
}

impl RegisterRef {
    /// Stores `value` into the referenced register. Returns `true` when a
    /// threshold changed.
    pub(crate) fn commit(self, registers: &mut Registers, value: u16) -> bool {
        match self {
            RegisterRef::Th => {
                registers.threshold_high = value as i16;
                true
            }
            RegisterRef::Tl => {
                registers.threshold_low = value as i16;
                true
            }
            RegisterRef::Config => {
                registers.config = value as u8;
                false
            }
            RegisterRef::None => false,
        }
    }
}

/// Point-in-time copy of the externally visible sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStatus {
    pub stored_temperature: i32,
    pub measured_temperature: i32,
    pub config: u8,
    pub output_pin_level: bool,
    pub threshold_high: i16,
    pub threshold_low: i16,
    pub converting: bool,
}

/// Cloneable handle to one emulated chip's register file.
///
/// This is the external side of the device: a test harness injects the
/// "true" ambient temperature through it and inspects the derived state
/// without going through the byte protocol.
#[derive(Debug, Clone)]
pub struct SensorHandle {
    registers: Arc<Mutex<Registers>>,
}

impl SensorHandle {
    pub(crate) fn new(stored_temperature: i32) -> Self {
        Self {
            registers: Arc::new(Mutex::new(Registers::power_on(stored_temperature))),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Registers> {
        // Plain values only; a poisoned guard still holds a whole register file.
        self.registers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the ambient temperature. While converting continuously the new
    /// value is measured immediately.
    pub fn set_ambient_milli(&self, value: i32) {
        let mut registers = self.lock();
        registers.stored_temperature = value;
        if registers.converting_continuously {
            registers.reevaluate(value);
        }
    }

    pub fn stored_temperature(&self) -> i32 {
        self.lock().stored_temperature
    }

    pub fn measured_temperature(&self) -> i32 {
        self.lock().measured_temperature
    }

    pub fn get_output_pin_level(&self) -> bool {
        self.lock().output_pin_level()
    }

    pub fn get_raw_config(&self) -> u8 {
        self.lock().config
    }

    /// Returns `(TH, TL)` in native format.
    pub fn get_thresholds(&self) -> (i16, i16) {
        let registers = self.lock();
        (registers.threshold_high, registers.threshold_low)
    }

    pub fn is_converting(&self) -> bool {
        self.lock().converting_continuously
    }

    pub fn status(&self) -> SensorStatus {
        let registers = self.lock();
        SensorStatus {
            stored_temperature: registers.stored_temperature,
            measured_temperature: registers.measured_temperature,
            config: registers.config,
            output_pin_level: registers.output_pin_level(),
            threshold_high: registers.threshold_high,
            threshold_low: registers.threshold_low,
            converting: registers.converting_continuously,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(degrees: i16) -> i16 {
        degrees << 8
    }

    #[test]
    fn test_power_on_defaults() {
        let handle = SensorHandle::new(DEFAULT_AMBIENT_MILLI);
        let status = handle.status();
        assert_eq!(status.stored_temperature, 21_000);
        assert_eq!(status.measured_temperature, 0);
        assert_eq!(status.config, 0);
        assert_eq!((status.threshold_high, status.threshold_low), (0, 0));
        assert!(!status.converting);
        // inactive pin with active-low polarity drives logic 1
        assert!(status.output_pin_level);
    }

    #[test]
    fn test_reevaluate_sets_high_flag_and_pin() {
        let mut regs = Registers::power_on(0);
        regs.threshold_high = native(30);
        regs.threshold_low = native(10);
        regs.reevaluate(29_999);
        assert_eq!(regs.config & (CONFIG_THF | CONFIG_TLF), 0);
        assert!(!regs.output_pin_active);
        regs.reevaluate(30_000);
        assert_eq!(regs.config & CONFIG_THF, CONFIG_THF);
        assert!(regs.output_pin_active);
    }

    #[test]
    fn test_flags_and_pin_are_sticky_inside_band() {
        let mut regs = Registers::power_on(0);
        regs.threshold_high = native(30);
        regs.threshold_low = native(10);
        regs.reevaluate(31_000);
        regs.reevaluate(20_000);
        assert_eq!(regs.config & CONFIG_THF, CONFIG_THF);
        assert!(regs.output_pin_active);
        // reaching TL sets the flag, the pin only drops strictly below it
        regs.reevaluate(10_000);
        assert_eq!(regs.config & CONFIG_TLF, CONFIG_TLF);
        assert!(regs.output_pin_active);
        regs.reevaluate(9_500);
        assert!(!regs.output_pin_active);
        assert_eq!(regs.config & CONFIG_THF, CONFIG_THF);
    }

    #[test]
    fn test_output_pin_polarity() {
        let mut regs = Registers::power_on(0);
        regs.output_pin_active = true;
        assert!(!regs.output_pin_level());
        regs.config |= CONFIG_POL;
        assert!(regs.output_pin_level());
        regs.output_pin_active = false;
        assert!(!regs.output_pin_level());
    }

    #[test]
    fn test_commit_targets() {
        let mut regs = Registers::power_on(0);
        assert!(RegisterRef::Th.commit(&mut regs, 0x1234));
        assert!(RegisterRef::Tl.commit(&mut regs, 0xf680));
        assert!(!RegisterRef::Config.commit(&mut regs, 0x12_03));
        assert!(!RegisterRef::None.commit(&mut regs, 0xffff));
        assert_eq!(regs.threshold_high, 0x1234);
        assert_eq!(regs.threshold_low, 0xf680u16 as i16);
        assert_eq!(regs.config, 0x03);
    }

    #[test]
    fn test_ambient_only_measured_while_converting() {
        let handle = SensorHandle::new(DEFAULT_AMBIENT_MILLI);
        handle.set_ambient_milli(42_420);
        assert_eq!(handle.stored_temperature(), 42_420);
        assert_eq!(handle.measured_temperature(), 0);
        handle.lock().converting_continuously = true;
        handle.set_ambient_milli(-5_000);
        assert_eq!(handle.measured_temperature(), -5_000);
        // TL = TH = 0, so -5°C is at or below TL
        assert_eq!(handle.get_raw_config() & CONFIG_TLF, CONFIG_TLF);
    }
}
