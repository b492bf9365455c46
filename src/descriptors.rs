use device_descriptor::*;

device! {
    /// Remaining active absolute capacity, in percent of the full capacity.
    Rarc(u8, addr = 0x06)
    /// Remaining standby absolute capacity, in percent of the full capacity.
    Rsrc(u8, addr = 0x07)
    /// Cell temperature. The low five bits are reserved.
    Temperature(u16, addr = 0x0A)
    /// Battery voltage. The low five bits are reserved.
    Voltage(u16, addr = 0x0C)
    /// Sense resistor voltage drop, two's complement.
    Current(u16, addr = 0x0E)
}

impl Voltage {
    /// Signed reading with the reserved bits dropped.
    pub fn raw(self) -> i16 {
        (self.bits() as i16) >> 5
    }
}

impl Temperature {
    /// Signed reading with the reserved bits dropped. LSB = 0.125°C.
    pub fn raw(self) -> i16 {
        (self.bits() as i16) >> 5
    }
}

impl Current {
    /// LSB = 1.5625μV / r_sense
    pub fn raw(self) -> i16 {
        self.bits() as i16
    }
}

impl Rarc {
    pub fn percentage(self) -> u8 {
        self.bits()
    }
}

impl Rsrc {
    pub fn percentage(self) -> u8 {
        self.bits()
    }
}

/// Writable bytes of the parameter EEPROM block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ParameterAddress {
    /// Aging capacity (AC), most significant byte.
    AgingCapacityMsb = 0x62,
    /// Aging capacity (AC), least significant byte.
    AgingCapacityLsb = 0x63,
    /// Charge voltage threshold used to detect a full cell (VCHG).
    ChargeVoltage = 0x64,
    /// Charge current threshold used to detect a full cell (IMIN).
    MinChargeCurrent = 0x65,
    /// Voltage threshold of the active empty point (VAE).
    ActiveEmptyVoltage = 0x66,
    /// Discharge current threshold of the active empty point (IAE).
    ActiveEmptyCurrent = 0x67,
    /// Sense resistor prime (RSNSP), used for absolute capacity results.
    SenseResistor = 0x69,

    FullSlope4 = 0x6C,
    FullSlope3 = 0x6D,
    FullSlope2 = 0x6E,
    FullSlope1 = 0x6F,
    ActiveEmptySlope4 = 0x70,
    ActiveEmptySlope3 = 0x71,
    ActiveEmptySlope2 = 0x72,
    ActiveEmptySlope1 = 0x73,
    TemperatureBreakpoint34 = 0x7C,
    TemperatureBreakpoint23 = 0x7D,
    TemperatureBreakpoint12 = 0x7E,
}

impl ParameterAddress {
    pub const fn address(self) -> u8 {
        self as u8
    }

    pub const fn region(self) -> MemoryRegion {
        match self {
            Self::AgingCapacityMsb
            | Self::AgingCapacityLsb
            | Self::ChargeVoltage
            | Self::MinChargeCurrent
            | Self::ActiveEmptyVoltage
            | Self::ActiveEmptyCurrent
            | Self::SenseResistor => MemoryRegion::ApplicationParameter,
            _ => MemoryRegion::CellCharacteristic,
        }
    }
}

impl From<ParameterAddress> for u8 {
    fn from(address: ParameterAddress) -> u8 {
        address.address()
    }
}
