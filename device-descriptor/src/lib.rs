#![no_std]

use byteorder::{BigEndian, ByteOrder};

/// Storage type of a register. Multi-byte registers travel MSB first.
pub trait RegisterWidthType: Copy {
    const WIDTH: u8;
    const BYTES: usize = Self::WIDTH as usize / 8;

    fn from_msb_first(bytes: &[u8]) -> Self;
}

impl RegisterWidthType for u8 {
    const WIDTH: u8 = 8;

    fn from_msb_first(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() == Self::BYTES);
        bytes[0]
    }
}

impl RegisterWidthType for u16 {
    const WIDTH: u8 = 16;

    fn from_msb_first(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() == Self::BYTES);
        BigEndian::read_u16(bytes)
    }
}

/// The EEPROM block a parameter byte belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryRegion {
    /// Application parameters (charge thresholds, aging capacity, sense resistor).
    ApplicationParameter,
    /// Cell characteristic constants (segment slopes, temperature breakpoints).
    CellCharacteristic,
}

pub trait Proxy: Copy {
    type Width: RegisterWidthType;

    fn bits(&self) -> Self::Width;
    fn from_bits(bits: Self::Width) -> Self;
}

pub trait ReadOnlyRegister: Proxy {
    const ADDRESS: u8;
    const NAME: &'static str;
}

#[macro_export]
macro_rules! register {
    ($(#[$meta:meta])* $reg:ident($rwt:ty, addr = $addr:literal)) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        #[must_use]
        pub struct $reg {
            value: $rwt,
        }

        impl $crate::ReadOnlyRegister for $reg {
            const ADDRESS: u8 = $addr;
            const NAME: &'static str = stringify!($reg);
        }

        impl $crate::Proxy for $reg {
            type Width = $rwt;

            #[inline(always)]
            fn from_bits(bits: $rwt) -> Self {
                Self { value: bits }
            }

            #[inline(always)]
            fn bits(&self) -> $rwt {
                self.value
            }
        }
    };
}

#[macro_export]
macro_rules! device {
    ($( $(#[$meta:meta])* $reg:ident($($proto:tt)*) )+) => {
        $(
            $crate::register!($(#[$meta])* $reg($($proto)*));
        )+
    };
}
