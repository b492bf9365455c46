use register_access::RegisterAccess;

use crate::bus::{OneWire, RomCode, MATCH_ROM, SKIP_ROM};

/// Memory function: read bytes starting at the address that follows.
pub const READ_DATA: u8 = 0x69;
/// Memory function: write bytes starting at the address that follows.
pub const WRITE_DATA: u8 = 0x6C;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError<E> {
    /// The reset pulse was not answered.
    NoPresence,
    Bus(E),
}

impl<E> From<E> for TransferError<E> {
    fn from(e: E) -> Self {
        Self::Bus(e)
    }
}

/// ROM function used after the reset pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select<'a> {
    Match(&'a RomCode),
    Skip,
}

/// One register transaction sequence on a borrowed bus.
///
/// Every `read_sequential`/`write_sequential` call is a complete transaction:
/// reset, ROM function, memory function, address, data.
pub struct Ds2781OneWireInterface<'a, W> {
    bus: &'a mut W,
    select: Select<'a>,
}

impl<'a, W> Ds2781OneWireInterface<'a, W>
where
    W: OneWire,
{
    pub fn new(bus: &'a mut W, select: Select<'a>) -> Self {
        Self { bus, select }
    }

    /// Writes the match ROM command followed by the ROM code.
    ///
    /// Must directly follow a reset with presence; does not reset the bus itself.
    pub fn match_rom(&mut self, rom: &RomCode) -> Result<(), W::Error> {
        self.bus.write_byte(MATCH_ROM)?;
        for &byte in rom.bytes() {
            self.bus.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn skip_rom(&mut self) -> Result<(), W::Error> {
        self.bus.write_byte(SKIP_ROM)
    }

    fn begin(&mut self, function: u8, address: u8) -> Result<(), TransferError<W::Error>> {
        if !self.bus.reset()? {
            warn!("No presence pulse, dropping transaction at {}", address);
            return Err(TransferError::NoPresence);
        }

        let select = self.select;
        match select {
            Select::Match(rom) => self.match_rom(rom)?,
            Select::Skip => self.skip_rom()?,
        }

        trace!("Memory function {} at {}", function, address);
        self.bus.write_byte(function)?;
        self.bus.write_byte(address)?;

        Ok(())
    }
}

impl<W> RegisterAccess for Ds2781OneWireInterface<'_, W>
where
    W: OneWire,
{
    type Error = TransferError<W::Error>;

    fn read_sequential(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.begin(READ_DATA, address)?;
        for byte in buffer.iter_mut() {
            *byte = self.bus.read_byte()?;
        }
        Ok(())
    }

    fn write_sequential(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.begin(WRITE_DATA, address)?;
        for &byte in bytes {
            self.bus.write_byte(byte)?;
        }
        Ok(())
    }
}
