// src/device/command.rs - DS1621 command bytes

/// Commands understood by the DS1621.
///
/// The byte values are fixed by the part; host drivers send them as the
/// first byte of every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read or write the high threshold (2 bytes, MSB first).
    AccessTh,
    /// Read or write the low threshold (2 bytes, MSB first).
    AccessTl,
    /// Read or write the configuration register (1 byte).
    AccessConfig,
    /// Read COUNT_REMAIN latched by the last Read Temperature.
    ReadCounter,
    /// Read COUNT_PER_C latched by the last Read Temperature.
    ReadSlope,
    /// Read the last converted temperature (2 bytes, MSB first).
    ReadTemperature,
    StartConvert,
    StopConvert,
}

impl Command {
    pub const ACCESS_TH: u8 = 0xa1;
    pub const ACCESS_TL: u8 = 0xa2;
    pub const ACCESS_CONFIG: u8 = 0xac;
    pub const READ_COUNTER: u8 = 0xa8;
    pub const READ_SLOPE: u8 = 0xa9;
    pub const READ_TEMPERATURE: u8 = 0xaa;
    pub const START_CONVERT: u8 = 0xee;
    pub const STOP_CONVERT: u8 = 0x22;

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            Self::ACCESS_TH => Some(Command::AccessTh),
            Self::ACCESS_TL => Some(Command::AccessTl),
            Self::ACCESS_CONFIG => Some(Command::AccessConfig),
            Self::READ_COUNTER => Some(Command::ReadCounter),
            Self::READ_SLOPE => Some(Command::ReadSlope),
            Self::READ_TEMPERATURE => Some(Command::ReadTemperature),
            Self::START_CONVERT => Some(Command::StartConvert),
            Self::STOP_CONVERT => Some(Command::StopConvert),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Command::AccessTh => Self::ACCESS_TH,
            Command::AccessTl => Self::ACCESS_TL,
            Command::AccessConfig => Self::ACCESS_CONFIG,
            Command::ReadCounter => Self::READ_COUNTER,
            Command::ReadSlope => Self::READ_SLOPE,
            Command::ReadTemperature => Self::READ_TEMPERATURE,
            Command::StartConvert => Self::START_CONVERT,
            Command::StopConvert => Self::STOP_CONVERT,
        }
    }

    /// Number of data bytes that follow the command on the wire.
    pub fn transfer_len(self) -> u8 {
        match self {
            Command::AccessTh | Command::AccessTl | Command::ReadTemperature => 2,
            Command::AccessConfig | Command::ReadCounter | Command::ReadSlope => 1,
            Command::StartConvert | Command::StopConvert => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_mapping_is_bijective() {
        let all = [
            Command::AccessTh,
            Command::AccessTl,
            Command::AccessConfig,
            Command::ReadCounter,
            Command::ReadSlope,
            Command::ReadTemperature,
            Command::StartConvert,
            Command::StopConvert,
        ];
        for command in all {
            assert_eq!(Command::from_byte(command.to_byte()), Some(command));
        }
        let known = (0..=u8::MAX).filter(|b| Command::from_byte(*b).is_some()).count();
        assert_eq!(known, all.len());
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(Command::from_byte(0x00), None);
        assert_eq!(Command::from_byte(0xff), None);
        assert_eq!(Command::from_byte(0x17), None);
    }
}
