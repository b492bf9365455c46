//! The 1-Wire transport seam and device addressing.

use crc::{Crc, CRC_8_MAXIM_DOW};

/// Selects a single device by its ROM code.
pub const MATCH_ROM: u8 = 0x55;
/// Addresses every device on the bus at once. Only valid with one device.
pub const SKIP_ROM: u8 = 0xCC;

/// The family code burned into every DS2781.
pub const FAMILY_CODE: u8 = 0x3D;

/// Dallas/Maxim CRC8 protecting the ROM code, polynomial X^8 + X^5 + X^4 + 1.
const ROM_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Byte-level 1-Wire bus master.
///
/// Reset pulse timing, bit slots and ROM search belong to the implementor.
pub trait OneWire {
    type Error;

    /// Issues a reset pulse. Returns `true` if a device answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, Self::Error>;
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

impl<T> OneWire for &mut T
where
    T: OneWire + ?Sized,
{
    type Error = T::Error;

    fn reset(&mut self) -> Result<bool, Self::Error> {
        T::reset(*self)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::write_byte(*self, byte)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(*self)
    }
}

/// 64-bit registration number of a 1-Wire device, least significant byte first:
/// family code, 48-bit serial number, CRC8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RomCode([u8; 8]);

impl RomCode {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub const fn family_code(&self) -> u8 {
        self.0[0]
    }

    pub const fn crc(&self) -> u8 {
        self.0[7]
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&byte| byte == 0)
    }

    /// Checks the trailing CRC8 against the first seven bytes.
    ///
    /// ```rust
    /// # use ds2781::bus::RomCode;
    /// let rom = RomCode::new([0x3D, 0xD0, 0x1B, 0xD7, 0x00, 0x00, 0x00, 0x63]);
    /// assert!(rom.is_crc_valid());
    ///
    /// let rom = RomCode::new([0x3D, 0xD0, 0x1B, 0xD7, 0x00, 0x00, 0x00, 0x64]);
    /// assert!(!rom.is_crc_valid());
    /// ```
    pub fn is_crc_valid(&self) -> bool {
        ROM_CRC.checksum(&self.0[..7]) == self.crc()
    }

    pub fn is_ds2781(&self) -> bool {
        self.family_code() == FAMILY_CODE
    }
}

impl From<[u8; 8]> for RomCode {
    fn from(bytes: [u8; 8]) -> Self {
        Self::new(bytes)
    }
}

/// How the driver selects its device after each bus reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceIdentity {
    /// Address the device with match ROM.
    Rom(RomCode),
    /// No ROM code known, the device is alone on the bus.
    Skip,
}

impl From<RomCode> for DeviceIdentity {
    fn from(rom: RomCode) -> Self {
        if rom.is_blank() {
            Self::Skip
        } else {
            Self::Rom(rom)
        }
    }
}

impl From<[u8; 8]> for DeviceIdentity {
    fn from(bytes: [u8; 8]) -> Self {
        RomCode::new(bytes).into()
    }
}
