//! Detection of a parasitically powered gauge.
//!
//! When the board supply collapses, the DS2781 and the local rail are fed
//! through the 1-Wire pull-up only. The rail then sits well below its nominal
//! level, which is what a [`PowerSense`] reports.

use embedded_hal::digital::InputPin;

pub trait PowerSense {
    type Error;

    /// Supply level normalized to `0.0..=1.0` of full scale.
    fn read_level(&mut self) -> Result<f32, Self::Error>;
}

impl<T> PowerSense for &mut T
where
    T: PowerSense + ?Sized,
{
    type Error = T::Error;

    fn read_level(&mut self) -> Result<f32, Self::Error> {
        T::read_level(*self)
    }
}

/// A comparator or level-shifted rail on a GPIO, high while the supply is good.
pub struct DigitalPowerSense<P> {
    pin: P,
}

impl<P> DigitalPowerSense<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> PowerSense for DigitalPowerSense<P>
where
    P: InputPin,
{
    type Error = P::Error;

    fn read_level(&mut self) -> Result<f32, Self::Error> {
        Ok(if self.pin.is_high()? { 1.0 } else { 0.0 })
    }
}
