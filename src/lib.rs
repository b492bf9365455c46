//! Driver for the Maxim DS2781 stand-alone fuel gauge on a 1-Wire bus.
//!
//! The driver owns the bus master for its whole lifetime; every operation
//! is one blocking reset/select/read (or write) sequence, never cached or retried.
//!
//! ```rust,ignore
//! let mut gauge = Ds2781::new(onewire, DeviceIdentity::from(BATTERY_ROM));
//!
//! let voltage = gauge.read_voltage()?;
//! let reading = gauge.measure_current()?;
//! if let Some(amps) = reading.ok() {
//!     info!("Current: {} A", amps);
//! }
//! ```

#![no_std]

#[macro_use]
extern crate logger;

pub mod bus;
pub mod config;
pub mod descriptors;
pub mod ll;
pub mod power;

#[cfg(test)]
mod mock;

use device_descriptor::ReadOnlyRegister;
use register_access::{RegisterAccess, RegisterReader};

use crate::{
    bus::{DeviceIdentity, OneWire, FAMILY_CODE},
    config::{Addressing, Calibration, Config},
    descriptors::{Current, ParameterAddress, Rarc, Rsrc, Temperature, Voltage},
    ll::{Ds2781OneWireInterface, Select, TransferError},
    power::PowerSense,
};

/// Value reported by [`Ds2781::read_voltage_debug`] when the gauge is unpowered.
pub const VOLTAGE_SENTINEL: f32 = -1.0;
/// Value reported by the temperature and current debug reads when the gauge is unpowered.
pub const ZERO_SENTINEL: f32 = 0.0;

/// How a bus operation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Ok,
    /// No presence pulse after the bus reset.
    BusAbsent,
    /// The supply sensor reported the gauge running off the 1-Wire line;
    /// the bus was not touched.
    PowerAbsent,
}

/// A decoded measurement together with how it was obtained.
///
/// Unless `outcome` is [`Outcome::Ok`], `value` is a stand-in: zero for bus
/// failures, the operation's sentinel for missing power.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Reading<T> {
    const fn new(value: T, outcome: Outcome) -> Self {
        Self { value, outcome }
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Ok
    }

    pub fn ok(self) -> Option<T> {
        if self.success() {
            Some(self.value)
        } else {
            None
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SenseError<B, S> {
    Bus(B),
    Sense(S),
}

pub struct Ds2781<W> {
    bus: W,
    identity: DeviceIdentity,
    config: Config,
}

impl<W> Ds2781<W> {
    pub const fn new(bus: W, identity: DeviceIdentity) -> Self {
        Self::with_config(bus, identity, Config::DEFAULT)
    }

    pub const fn with_config(bus: W, identity: DeviceIdentity, config: Config) -> Self {
        Self {
            bus,
            identity,
            config,
        }
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.config.calibration
    }

    /// The DS2781 family code. Fixed by the device type, not read from the bus.
    pub fn read_family_code(&self) -> u8 {
        FAMILY_CODE
    }

    pub fn bus_mut(&mut self) -> &mut W {
        &mut self.bus
    }

    pub fn release(self) -> W {
        self.bus
    }
}

impl<W> Ds2781<W>
where
    W: OneWire,
{
    fn interface(&mut self, addressing: Addressing) -> Ds2781OneWireInterface<'_, W> {
        let select = match (addressing, &self.identity) {
            (Addressing::Explicit, DeviceIdentity::Rom(rom)) => Select::Match(rom),
            _ => Select::Skip,
        };

        Ds2781OneWireInterface::new(&mut self.bus, select)
    }

    fn measure<R, T>(
        &mut self,
        addressing: Addressing,
        decode: impl FnOnce(&Calibration, R) -> T,
    ) -> Result<Reading<T>, W::Error>
    where
        R: ReadOnlyRegister,
        T: Default,
    {
        let result = <R as RegisterReader>::read(&mut self.interface(addressing));
        match result {
            Ok(register) => Ok(Reading::new(
                decode(&self.config.calibration, register),
                Outcome::Ok,
            )),
            Err(TransferError::NoPresence) => {
                warn!("{} read failed: no device on the bus", R::NAME);
                Ok(Reading::new(T::default(), Outcome::BusAbsent))
            }
            Err(TransferError::Bus(e)) => {
                error!("{} read failed: bus error", R::NAME);
                Err(e)
            }
        }
    }

    /// Reads the battery voltage in V.
    pub fn measure_voltage(&mut self) -> Result<Reading<f32>, W::Error> {
        self.measure(self.config.addressing.voltage, |cal, reg: Voltage| {
            cal.raw_voltage_to_volts(reg.raw())
        })
    }

    /// Reads the cell temperature in °C.
    pub fn measure_temperature(&mut self) -> Result<Reading<f32>, W::Error> {
        self.measure(self.config.addressing.temperature, |cal, reg: Temperature| {
            cal.raw_temperature_to_celsius(reg.raw())
        })
    }

    /// Reads the battery current in A. Positive while charging.
    pub fn measure_current(&mut self) -> Result<Reading<f32>, W::Error> {
        self.measure(self.config.addressing.current, |cal, reg: Current| {
            cal.raw_current_to_amps(reg.raw())
        })
    }

    /// Reads the remaining active capacity (RARC) in %, unscaled.
    pub fn measure_percentage_remaining(&mut self) -> Result<Reading<u8>, W::Error> {
        self.measure(self.config.addressing.remaining_capacity, |_, reg: Rarc| {
            reg.percentage()
        })
    }

    /// Reads the remaining standby capacity (RSRC) in %, unscaled.
    pub fn measure_standby_percentage(&mut self) -> Result<Reading<u8>, W::Error> {
        self.measure(self.config.addressing.standby_capacity, |_, reg: Rsrc| {
            reg.percentage()
        })
    }

    /// Returns the battery voltage in V, or 0 if the gauge did not answer.
    pub fn read_voltage(&mut self) -> Result<f32, W::Error> {
        Ok(self.measure_voltage()?.value)
    }

    /// Returns the cell temperature in °C, or 0 if the gauge did not answer.
    pub fn read_temperature(&mut self) -> Result<f32, W::Error> {
        Ok(self.measure_temperature()?.value)
    }

    /// Returns the battery current in A, or 0 if the gauge did not answer.
    pub fn read_current(&mut self) -> Result<f32, W::Error> {
        Ok(self.measure_current()?.value)
    }

    /// Returns the remaining capacity in %, or 0 if the gauge did not answer.
    pub fn read_percentage_remaining(&mut self) -> Result<u8, W::Error> {
        Ok(self.measure_percentage_remaining()?.value)
    }

    /// Writes one byte of the cell characteristic or application parameter block.
    ///
    /// The byte is written to the shadow RAM only, without read-back.
    pub fn set_register(
        &mut self,
        value: u8,
        address: ParameterAddress,
    ) -> Result<Outcome, W::Error> {
        let addressing = self.config.addressing.parameter_write;
        let result = self
            .interface(addressing)
            .write_sequential(address.address(), &[value]);
        match result {
            Ok(()) => Ok(Outcome::Ok),
            Err(TransferError::NoPresence) => {
                warn!("Write to {:?} failed: no device on the bus", address);
                Ok(Outcome::BusAbsent)
            }
            Err(TransferError::Bus(e)) => {
                error!("Write to {:?} failed: bus error", address);
                Err(e)
            }
        }
    }

    fn measure_if_powered<P, T>(
        &mut self,
        sense: &mut P,
        sentinel: T,
        measure: impl FnOnce(&mut Self) -> Result<Reading<T>, W::Error>,
    ) -> Result<Reading<T>, SenseError<W::Error, P::Error>>
    where
        P: PowerSense,
    {
        let level = sense.read_level().map_err(SenseError::Sense)?;
        // A NaN level counts as unpowered.
        if !(level > self.config.power_threshold) {
            debug!("Supply level {} too low, skipping bus access", level);
            return Ok(Reading::new(sentinel, Outcome::PowerAbsent));
        }

        measure(self).map_err(SenseError::Bus)
    }

    /// Like [`Self::measure_voltage`], but first checks that the gauge is not
    /// running off the 1-Wire line. Reports [`VOLTAGE_SENTINEL`] if it is.
    pub fn read_voltage_debug<P>(
        &mut self,
        sense: &mut P,
    ) -> Result<Reading<f32>, SenseError<W::Error, P::Error>>
    where
        P: PowerSense,
    {
        self.measure_if_powered(sense, VOLTAGE_SENTINEL, Self::measure_voltage)
    }

    pub fn read_temperature_debug<P>(
        &mut self,
        sense: &mut P,
    ) -> Result<Reading<f32>, SenseError<W::Error, P::Error>>
    where
        P: PowerSense,
    {
        self.measure_if_powered(sense, ZERO_SENTINEL, Self::measure_temperature)
    }

    pub fn read_current_debug<P>(
        &mut self,
        sense: &mut P,
    ) -> Result<Reading<f32>, SenseError<W::Error, P::Error>>
    where
        P: PowerSense,
    {
        self.measure_if_powered(sense, ZERO_SENTINEL, Self::measure_current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        bus::{RomCode, MATCH_ROM, SKIP_ROM},
        config::AddressingPlan,
        ll::{READ_DATA, WRITE_DATA},
        mock::{Event, Level, MockBus, MockError, ROM},
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    fn gauge(responses: &[u8]) -> Ds2781<MockBus> {
        Ds2781::new(MockBus::new(responses), DeviceIdentity::from(ROM))
    }

    fn addressed(function: u8, address: u8) -> impl Iterator<Item = u8> {
        [MATCH_ROM]
            .into_iter()
            .chain(ROM)
            .chain([function, address])
    }

    #[test]
    fn voltage_drops_reserved_bits() {
        let mut gauge = gauge(&[0x01, 0x00]);

        assert!(close(gauge.read_voltage().unwrap(), 0.07736));

        let bus = gauge.release();
        assert_eq!(bus.resets(), 1);
        assert!(bus.written().eq(addressed(READ_DATA, 0x0C)));
    }

    #[test]
    fn temperature_is_signed() {
        let mut gauge = gauge(&[0xFF, 0xE0]);

        assert_eq!(gauge.read_temperature().unwrap(), -0.125);
        assert!(gauge.release().written().eq(addressed(READ_DATA, 0x0A)));
    }

    #[test]
    fn current_is_twos_complement() {
        #[rustfmt::skip]
        let table = [
            ([0x80, 0x00], -0.108_936_17),
            ([0x00, 0x01], 0.000_003_324_468),
            ([0xFF, 0xFF], -0.000_003_324_468),
            ([0x00, 0x00], 0.0),
        ];

        for (bytes, expected) in table {
            let mut gauge = gauge(&bytes);
            assert!(close(gauge.read_current().unwrap(), expected));
            assert!(gauge.release().written().eq(addressed(READ_DATA, 0x0E)));
        }
    }

    #[test]
    fn percentage_is_returned_unmodified_using_skip_rom() {
        for percentage in [0, 42, 100, 255] {
            let mut gauge = gauge(&[percentage]);

            assert_eq!(gauge.read_percentage_remaining().unwrap(), percentage);

            let bus = gauge.release();
            assert!(bus.written().eq([SKIP_ROM, READ_DATA, 0x06]));
            assert_eq!(bus.log.last(), Some(&Event::Read(percentage)));
        }
    }

    #[test]
    fn standby_percentage_is_addressed() {
        let mut gauge = gauge(&[77]);

        let reading = gauge.measure_standby_percentage().unwrap();

        assert_eq!(reading, Reading::new(77, Outcome::Ok));
        assert!(gauge.release().written().eq(addressed(READ_DATA, 0x07)));
    }

    #[test]
    fn blank_identity_uses_skip_rom() {
        let mut gauge = Ds2781::new(MockBus::new(&[0x01, 0x00]), DeviceIdentity::from([0; 8]));

        assert!(close(gauge.read_voltage().unwrap(), 0.07736));
        assert!(gauge.release().written().eq([SKIP_ROM, READ_DATA, 0x0C]));
    }

    #[test]
    fn blank_identity_never_sends_a_zero_rom_code() {
        let mut gauge = Ds2781::new(
            MockBus::new(&[0xFF, 0xE0, 0x00, 0x01]),
            DeviceIdentity::from([0; 8]),
        );

        assert_eq!(gauge.identity(), DeviceIdentity::Skip);
        assert_eq!(gauge.read_temperature().unwrap(), -0.125);
        assert!(close(gauge.read_current().unwrap(), 0.000_003_324_468));
        assert_eq!(
            gauge.set_register(0xD5, ParameterAddress::ChargeVoltage),
            Ok(Outcome::Ok)
        );

        #[rustfmt::skip]
        let expected = [
            SKIP_ROM, READ_DATA, 0x0A,
            SKIP_ROM, READ_DATA, 0x0E,
            SKIP_ROM, WRITE_DATA, 0x64, 0xD5,
        ];

        let bus = gauge.release();
        assert_eq!(bus.resets(), 3);
        assert!(bus.written().all(|byte| byte != MATCH_ROM));
        assert!(bus.written().eq(expected));
    }

    #[test]
    fn addressing_plan_is_per_operation() {
        let config = Config {
            addressing: AddressingPlan {
                remaining_capacity: Addressing::Explicit,
                ..AddressingPlan::uniform(Addressing::SkipAll)
            },
            ..Config::DEFAULT
        };

        let mut gauge = Ds2781::with_config(MockBus::new(&[0x00, 0x00, 50]), ROM.into(), config);

        gauge.read_temperature().unwrap();
        gauge.read_percentage_remaining().unwrap();

        let expected = [SKIP_ROM, READ_DATA, 0x0A]
            .into_iter()
            .chain(addressed(READ_DATA, 0x06));
        assert!(gauge.release().written().eq(expected));
    }

    #[test]
    fn absent_device_reads_as_zero_without_writes() {
        let mut gauge = Ds2781::new(MockBus::absent(), DeviceIdentity::from(ROM));

        assert_eq!(gauge.read_voltage().unwrap(), 0.0);
        assert_eq!(gauge.read_temperature().unwrap(), 0.0);
        assert_eq!(gauge.read_current().unwrap(), 0.0);
        assert_eq!(gauge.read_percentage_remaining().unwrap(), 0);

        let bus = gauge.release();
        assert_eq!(bus.resets(), 4);
        assert_eq!(bus.written().count(), 0);
    }

    #[test]
    fn absent_device_is_distinguishable_from_zero() {
        let mut gauge = Ds2781::new(MockBus::absent(), DeviceIdentity::from(ROM));
        let absent = gauge.measure_current().unwrap();

        let mut gauge = self::gauge(&[0x00, 0x00]);
        let zero = gauge.measure_current().unwrap();

        assert_eq!(absent, Reading::new(0.0, Outcome::BusAbsent));
        assert_eq!(absent.ok(), None);
        assert_eq!(zero, Reading::new(0.0, Outcome::Ok));
        assert_eq!(zero.ok(), Some(0.0));
    }

    #[test]
    fn bus_errors_are_propagated() {
        let mut bus = MockBus::new(&[]);
        bus.fail_after_writes = Some(0);
        let mut gauge = Ds2781::new(bus, DeviceIdentity::from(ROM));

        assert_eq!(gauge.read_voltage(), Err(MockError));
        assert_eq!(
            gauge.set_register(0xD5, ParameterAddress::ChargeVoltage),
            Err(MockError)
        );

        // Running out of response bytes mid-read is a transfer error too.
        let mut gauge = self::gauge(&[0x01]);
        assert_eq!(gauge.measure_voltage(), Err(MockError));
    }

    #[test]
    fn set_register_writes_the_data_byte_after_the_address() {
        let mut gauge = gauge(&[]);

        assert_eq!(
            gauge.set_register(0xD5, ParameterAddress::ChargeVoltage),
            Ok(Outcome::Ok)
        );

        let bus = gauge.release();
        assert_eq!(bus.resets(), 1);
        assert!(bus.written().eq(addressed(WRITE_DATA, 0x64).chain([0xD5])));
        assert!(bus.written().skip(9).eq([WRITE_DATA, 0x64, 0xD5]));
    }

    #[test]
    fn set_register_without_presence_writes_nothing() {
        let mut gauge = Ds2781::new(MockBus::absent(), DeviceIdentity::from(ROM));

        assert_eq!(
            gauge.set_register(0x12, ParameterAddress::FullSlope1),
            Ok(Outcome::BusAbsent)
        );

        let bus = gauge.release();
        assert_eq!(bus.log, MockBus::events(&[Event::Reset]));
    }

    #[test]
    fn debug_reads_skip_the_bus_without_power() {
        for level in [0.0, 0.3, 0.6, -1.0, f32::NAN] {
            let mut gauge = gauge(&[0x01, 0x00]);
            let mut sense = Level::new(level);

            let voltage = gauge.read_voltage_debug(&mut sense).unwrap();
            let temperature = gauge.read_temperature_debug(&mut sense).unwrap();
            let current = gauge.read_current_debug(&mut sense).unwrap();

            assert_eq!(voltage, Reading::new(VOLTAGE_SENTINEL, Outcome::PowerAbsent));
            assert_ne!(voltage.value, 0.0);
            assert_eq!(temperature, Reading::new(0.0, Outcome::PowerAbsent));
            assert_eq!(current, Reading::new(0.0, Outcome::PowerAbsent));
            assert!(!voltage.success());

            assert_eq!(sense.reads, 3);
            assert!(gauge.release().log.is_empty());
        }
    }

    #[test]
    fn debug_reads_report_success_with_power() {
        let mut gauge = gauge(&[0x01, 0x00, 0xFF, 0xE0, 0x00, 0x01]);
        let mut sense = Level::new(0.61);

        let voltage = gauge.read_voltage_debug(&mut sense).unwrap();
        let temperature = gauge.read_temperature_debug(&mut sense).unwrap();
        let current = gauge.read_current_debug(&mut sense).unwrap();

        assert!(voltage.success());
        assert!(close(voltage.value, 0.07736));
        assert_eq!(temperature, Reading::new(-0.125, Outcome::Ok));
        assert!(current.success());
        assert!(close(current.value, 0.000_003_324_468));
        assert_eq!(gauge.release().resets(), 3);
    }

    #[test]
    fn debug_reads_report_missing_device() {
        let mut gauge = Ds2781::new(MockBus::absent(), DeviceIdentity::from(ROM));

        let reading = gauge.read_voltage_debug(&mut Level::new(1.0)).unwrap();

        assert_eq!(reading, Reading::new(0.0, Outcome::BusAbsent));
        assert!(!reading.success());
    }

    #[test]
    fn debug_reads_propagate_bus_errors() {
        let mut bus = MockBus::new(&[]);
        bus.fail_after_writes = Some(0);
        let mut gauge = Ds2781::new(bus, DeviceIdentity::from(ROM));

        assert_eq!(
            gauge.read_current_debug(&mut Level::new(1.0)),
            Err(SenseError::Bus(MockError))
        );
    }

    #[test]
    fn calibration_comes_from_config() {
        let config = Config {
            calibration: Calibration::with_sense_resistor(0.025),
            ..Config::DEFAULT
        };
        let mut gauge = Ds2781::with_config(MockBus::new(&[0x00, 0x10]), ROM.into(), config);

        assert!(close(gauge.read_current().unwrap(), 16.0 * 0.000_062_5));
    }

    #[test]
    fn family_code_and_identity() {
        let gauge = gauge(&[]);

        assert_eq!(gauge.read_family_code(), 0x3D);
        assert_eq!(gauge.identity(), DeviceIdentity::Rom(RomCode::new(ROM)));
    }
}
