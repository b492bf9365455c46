#![no_std]

use device_descriptor::{ReadOnlyRegister, RegisterWidthType};

/// Largest register width, in bytes, that `read_register` can buffer.
const MAX_REGISTER_BYTES: usize = 2;

pub trait RegisterReader: Sized {
    fn read<E>(iface: &mut impl RegisterAccess<Error = E>) -> Result<Self, E>;
}

impl<T> RegisterReader for T
where
    T: ReadOnlyRegister,
{
    fn read<E>(iface: &mut impl RegisterAccess<Error = E>) -> Result<Self, E> {
        iface.read_register()
    }
}

/// Byte-addressed access to a device memory map.
///
/// Implementors provide the sequential transfers; a single call must be one
/// uninterrupted bus transaction starting at `address`.
pub trait RegisterAccess {
    type Error;

    fn read_sequential(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
    fn write_sequential(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister,
    {
        let mut buffer = [0; MAX_REGISTER_BYTES];
        let bytes = &mut buffer[..<R::Width as RegisterWidthType>::BYTES];

        self.read_sequential(R::ADDRESS, bytes)?;

        Ok(R::from_bits(<R::Width as RegisterWidthType>::from_msb_first(bytes)))
    }
}

impl<T> RegisterAccess for &mut T
where
    T: RegisterAccess + ?Sized,
{
    type Error = T::Error;

    fn read_sequential(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        T::read_sequential(*self, address, buffer)
    }

    fn write_sequential(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        T::write_sequential(*self, address, bytes)
    }
}
