use tracing::{debug, info, warn};

use super::pins::{Gpio, Level, OwnerTag, PinConfig, PinRegistry};
use crate::error::{ControllerError, Result};

/// Owner tag used for every pin the controller allocates
pub const OWNER: OwnerTag = OwnerTag("UM_GuitarLed");

/// Owns the three encoder inputs (DT, CLK, SW) through the host pin registry
pub struct PinAdapter<G, R> {
    gpio: G,
    registry: R,
    pins: PinConfig,
    owned: bool,
    owner: OwnerTag,
}

impl<G, R> PinAdapter<G, R>
where
    G: Gpio,
    R: PinRegistry,
{
    pub fn new(gpio: G, registry: R, pins: PinConfig) -> Self {
        Self {
            gpio,
            registry,
            pins,
            owned: false,
            owner: OWNER,
        }
    }

    /// Store a pin assignment without touching the registry.
    ///
    /// Only valid while no pins are held; used when config is read before setup.
    pub fn configure(&mut self, pins: PinConfig) {
        if self.owned {
            warn!("configure() called while pins are held; use reconfigure()");
            return;
        }
        self.pins = pins;
    }

    pub fn pins(&self) -> PinConfig {
        self.pins
    }

    /// True once the pins are allocated and configured as inputs
    pub fn is_active(&self) -> bool {
        self.owned
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Atomically allocate all connected pins and switch them to pull-up inputs
    pub fn register_pins(&mut self, owner: OwnerTag) -> bool {
        if self.owned {
            return true;
        }
        if !self.pins.is_valid() {
            return false;
        }

        let pins = self.pins.connected();
        if !self.registry.allocate_multiple(&pins, owner) {
            return false;
        }

        for &pin in &pins {
            self.gpio.set_input_pullup(pin);
        }
        debug!("Allocated pins {:?} for {}", pins, owner);
        self.owner = owner;
        self.owned = true;
        true
    }

    /// Release every pin we hold under the tag it was registered with
    pub fn release_pins(&mut self) {
        if !self.owned {
            return;
        }
        for pin in self.pins.connected() {
            if !self.registry.deallocate(pin, self.owner) {
                warn!("Pin {} was not owned by {} on release", pin, self.owner);
            }
        }
        self.owned = false;
    }

    /// Move to a new pin set, or stay on the old one.
    ///
    /// On allocation failure the previous set is re-acquired and
    /// `PinAllocation` is returned; nothing is partially reconfigured.
    pub fn reconfigure(&mut self, new_pins: PinConfig) -> Result<()> {
        if new_pins == self.pins {
            return Ok(());
        }
        if !new_pins.is_valid() {
            return Err(ControllerError::InvalidPins {
                pin_a: new_pins.pin_a,
                pin_b: new_pins.pin_b,
            });
        }

        let was_owned = self.owned;
        let old_pins = self.pins;
        self.release_pins();
        self.pins = new_pins;

        if !was_owned || self.register_pins(self.owner) {
            info!("Encoder pins now {:?}", new_pins);
            return Ok(());
        }

        warn!("Could not allocate {:?}, restoring {:?}", new_pins, old_pins);
        self.pins = old_pins;
        if !self.register_pins(self.owner) {
            warn!("Previous pins {:?} could not be re-acquired", old_pins);
        }
        Err(ControllerError::PinAllocation {
            pins: new_pins.connected(),
        })
    }

    pub fn read_phase_a(&self) -> Level {
        self.read(self.pins.pin_a)
    }

    pub fn read_phase_b(&self) -> Level {
        self.read(self.pins.pin_b)
    }

    /// Switch level; a missing button reads as released (`High`)
    pub fn read_switch(&self) -> Level {
        self.read(self.pins.pin_c)
    }

    fn read(&self, pin: i8) -> Level {
        if !self.owned || pin < 0 {
            return Level::High;
        }
        self.gpio.read(pin as u8)
    }
}
