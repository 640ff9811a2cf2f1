//! Digital pin primitives shared by the adapter and its collaborators

use std::fmt;

/// Logic level of a digital input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Owner tag recorded by the pin registry for every allocated pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerTag(pub &'static str);

impl fmt::Display for OwnerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Pin identifiers for the encoder.
///
/// Negative values mean "not connected". The switch is optional; phase A
/// and phase B are required for the controller to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub pin_a: i8,
    pub pin_b: i8,
    pub pin_c: i8,
}

impl PinConfig {
    pub fn new(pin_a: i8, pin_b: i8, pin_c: i8) -> Self {
        Self { pin_a, pin_b, pin_c }
    }

    /// Both phase pins are usable
    pub fn is_valid(&self) -> bool {
        self.pin_a >= 0 && self.pin_b >= 0
    }

    pub fn has_switch(&self) -> bool {
        self.pin_c >= 0
    }

    /// Connected pins in A, B, SW order
    pub fn connected(&self) -> Vec<u8> {
        [self.pin_a, self.pin_b, self.pin_c]
            .iter()
            .filter(|&&p| p >= 0)
            .map(|&p| p as u8)
            .collect()
    }
}

/// Raw GPIO access used by the adapter
pub trait Gpio {
    /// Configure a pin as input with the internal pull-up enabled
    fn set_input_pullup(&mut self, pin: u8);

    /// Read the current level of a pin
    fn read(&self, pin: u8) -> Level;
}

/// Host-owned registry tracking which component owns each GPIO
pub trait PinRegistry {
    /// Allocate every pin for `owner`, or none of them
    fn allocate_multiple(&mut self, pins: &[u8], owner: OwnerTag) -> bool;

    /// Release `pin` only if it is held by `owner`
    fn deallocate(&mut self, pin: u8, owner: OwnerTag) -> bool;
}
