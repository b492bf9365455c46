//! Recording bus and sensor doubles for the unit tests.

use core::convert::Infallible;

use heapless::Vec;

use crate::{bus::OneWire, power::PowerSense};

/// ROM code of the battery monitor on the original logger board.
pub const ROM: [u8; 8] = [0x3D, 0xD0, 0x1B, 0xD7, 0x00, 0x00, 0x00, 0x63];

const LOG_SIZE: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Reset,
    Write(u8),
    Read(u8),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockError;

pub struct MockBus {
    pub present: bool,
    pub log: Vec<Event, LOG_SIZE>,
    pub fail_after_writes: Option<usize>,
    responses: Vec<u8, 16>,
    next: usize,
}

impl MockBus {
    pub fn new(responses: &[u8]) -> Self {
        Self {
            present: true,
            log: Vec::new(),
            fail_after_writes: None,
            responses: Vec::from_slice(responses).unwrap(),
            next: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new(&[])
        }
    }

    pub fn events(events: &[Event]) -> Vec<Event, LOG_SIZE> {
        Vec::from_slice(events).unwrap()
    }

    pub fn written(&self) -> impl Iterator<Item = u8> + '_ {
        self.log.iter().filter_map(|event| match event {
            Event::Write(byte) => Some(*byte),
            _ => None,
        })
    }

    pub fn resets(&self) -> usize {
        self.log.iter().filter(|&&event| event == Event::Reset).count()
    }
}

impl OneWire for MockBus {
    type Error = MockError;

    fn reset(&mut self) -> Result<bool, Self::Error> {
        self.log.push(Event::Reset).unwrap();
        Ok(self.present)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        if let Some(limit) = self.fail_after_writes {
            if self.written().count() >= limit {
                return Err(MockError);
            }
        }
        self.log.push(Event::Write(byte)).unwrap();
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let byte = *self.responses.get(self.next).ok_or(MockError)?;
        self.next += 1;
        self.log.push(Event::Read(byte)).unwrap();
        Ok(byte)
    }
}

/// Sensor that always reports the same level and counts how often it was asked.
pub struct Level {
    pub level: f32,
    pub reads: usize,
}

impl Level {
    pub fn new(level: f32) -> Self {
        Self { level, reads: 0 }
    }
}

impl PowerSense for Level {
    type Error = Infallible;

    fn read_level(&mut self) -> Result<f32, Self::Error> {
        self.reads += 1;
        Ok(self.level)
    }
}
