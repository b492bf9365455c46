/// Scale factors turning raw register values into engineering units.
///
/// The factors belong to a specific sense resistor and device revision.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Volts per voltage LSB.
    pub voltage_lsb: f32,
    /// Degrees Celsius per temperature LSB.
    pub temperature_lsb: f32,
    /// Amperes per current LSB.
    pub current_lsb: f32,
}

impl Calibration {
    /// Current register resolution, in volts across the sense resistor.
    pub const CURRENT_RESOLUTION: f32 = 0.000_001_562_5;

    /// Values used by the logger board the driver was brought up on.
    pub const DS2781: Self = Self {
        voltage_lsb: 0.009_67,
        temperature_lsb: 0.125,
        current_lsb: 0.000_003_324_468_09,
    };

    /// Board calibration for a different sense resistor.
    ///
    /// ```rust
    /// # use ds2781::config::Calibration;
    /// let calibration = Calibration::with_sense_resistor(0.025);
    ///
    /// assert_eq!(calibration.voltage_lsb, Calibration::DS2781.voltage_lsb);
    /// assert!((calibration.current_lsb - 0.0000625).abs() < 1e-9);
    /// ```
    pub fn with_sense_resistor(ohms: f32) -> Self {
        Self {
            current_lsb: Self::CURRENT_RESOLUTION / ohms,
            ..Self::DS2781
        }
    }

    /// Converts a voltage reading (reserved bits already dropped) to volts.
    ///
    /// ```rust
    /// # use ds2781::config::Calibration;
    /// let calibration = Calibration::DS2781;
    ///
    /// assert_eq!(calibration.raw_voltage_to_volts(0), 0.0);
    /// assert!((calibration.raw_voltage_to_volts(8) - 0.07736).abs() < 1e-6);
    /// ```
    #[inline]
    pub fn raw_voltage_to_volts(&self, raw: i16) -> f32 {
        raw as f32 * self.voltage_lsb
    }

    /// Converts a temperature reading (reserved bits already dropped) to °C.
    ///
    /// ```rust
    /// # use ds2781::config::Calibration;
    /// let calibration = Calibration::DS2781;
    ///
    /// assert_eq!(calibration.raw_temperature_to_celsius(-1), -0.125);
    /// assert_eq!(calibration.raw_temperature_to_celsius(200), 25.0);
    /// ```
    #[inline]
    pub fn raw_temperature_to_celsius(&self, raw: i16) -> f32 {
        raw as f32 * self.temperature_lsb
    }

    /// Converts a two's complement current reading to amperes.
    ///
    /// ```rust
    /// # use ds2781::config::Calibration;
    /// let calibration = Calibration::DS2781;
    ///
    /// assert!((calibration.raw_current_to_amps(i16::MIN) + 0.108936).abs() < 1e-6);
    /// assert!((calibration.raw_current_to_amps(1) - 3.324468e-6).abs() < 1e-11);
    /// ```
    #[inline]
    pub fn raw_current_to_amps(&self, raw: i16) -> f32 {
        raw as f32 * self.current_lsb
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DS2781
    }
}

/// ROM function an operation uses after the reset pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Addressing {
    /// Match ROM with the configured identity. Falls back to skip ROM when
    /// the driver was created without one.
    Explicit,
    /// Always skip ROM, assuming a single device on the bus.
    SkipAll,
}

/// Addressing mode of every bus operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressingPlan {
    pub voltage: Addressing,
    pub temperature: Addressing,
    pub current: Addressing,
    pub remaining_capacity: Addressing,
    pub standby_capacity: Addressing,
    pub parameter_write: Addressing,
}

impl AddressingPlan {
    /// Remaining capacity is read with skip ROM, everything else is addressed.
    pub const DEFAULT: Self = Self {
        voltage: Addressing::Explicit,
        temperature: Addressing::Explicit,
        current: Addressing::Explicit,
        remaining_capacity: Addressing::SkipAll,
        standby_capacity: Addressing::Explicit,
        parameter_write: Addressing::Explicit,
    };

    /// Uses the same mode for every operation.
    pub const fn uniform(addressing: Addressing) -> Self {
        Self {
            voltage: addressing,
            temperature: addressing,
            current: addressing,
            remaining_capacity: addressing,
            standby_capacity: addressing,
            parameter_write: addressing,
        }
    }
}

impl Default for AddressingPlan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub calibration: Calibration,
    pub addressing: AddressingPlan,
    /// Normalized supply level at or below which the device is considered
    /// parasitically powered from the 1-Wire line.
    pub power_threshold: f32,
}

impl Config {
    pub const DEFAULT: Self = Self {
        calibration: Calibration::DS2781,
        addressing: AddressingPlan::DEFAULT,
        power_threshold: 0.6,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
