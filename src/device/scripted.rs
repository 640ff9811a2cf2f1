//! In-memory GPIO and pin registry
//!
//! Used by the trace-replay binary and by tests. Levels are set from the
//! outside through a cloned [`ScriptedGpio`] handle between ticks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use super::pins::{Gpio, Level, OwnerTag, PinRegistry};

/// GPIO bank whose levels are driven by a script.
///
/// Clones share the same pin levels. Pins that were never driven read
/// `High`, matching an idle input with pull-up.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGpio {
    levels: Rc<RefCell<HashMap<u8, Level>>>,
    pullups: Rc<RefCell<Vec<u8>>>,
}

impl ScriptedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive a pin to a level; negative pins are ignored
    pub fn set(&self, pin: i8, level: Level) {
        if pin >= 0 {
            self.levels.borrow_mut().insert(pin as u8, level);
        }
    }

    /// Pins configured as pull-up inputs so far
    pub fn pullups(&self) -> Vec<u8> {
        self.pullups.borrow().clone()
    }
}

impl Gpio for ScriptedGpio {
    fn set_input_pullup(&mut self, pin: u8) {
        let mut pullups = self.pullups.borrow_mut();
        if !pullups.contains(&pin) {
            pullups.push(pin);
        }
    }

    fn read(&self, pin: u8) -> Level {
        self.levels
            .borrow()
            .get(&pin)
            .copied()
            .unwrap_or(Level::High)
    }
}

/// Pin ownership table keyed by GPIO number
#[derive(Debug, Clone, Default)]
pub struct MemoryPinRegistry {
    owners: HashMap<u8, OwnerTag>,
}

impl MemoryPinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner of a pin, if any
    pub fn owner_of(&self, pin: u8) -> Option<OwnerTag> {
        self.owners.get(&pin).copied()
    }

    /// Claim a pin for another component (simulates a conflict)
    pub fn reserve(&mut self, pin: u8, owner: OwnerTag) {
        self.owners.insert(pin, owner);
    }
}

impl PinRegistry for MemoryPinRegistry {
    fn allocate_multiple(&mut self, pins: &[u8], owner: OwnerTag) -> bool {
        let conflict = pins.iter().find(|pin| {
            self.owners
                .get(pin)
                .map(|current| *current != owner)
                .unwrap_or(false)
        });
        if let Some(pin) = conflict {
            debug!("Pin {} already owned, refusing allocation for {}", pin, owner);
            return false;
        }

        for &pin in pins {
            self.owners.insert(pin, owner);
        }
        true
    }

    fn deallocate(&mut self, pin: u8, owner: OwnerTag) -> bool {
        match self.owners.get(&pin) {
            Some(current) if *current == owner => {
                self.owners.remove(&pin);
                true
            }
            _ => false,
        }
    }
}
