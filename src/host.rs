//! Collaborators provided by the lighting firmware the controller runs in

use crate::catalogue::NameCatalogue;
use crate::input::PresetStep;

/// Reason attached to state changes so other interfaces know their origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Change caused by a physical button
    Button,
    /// Preset load requested from a button
    ButtonPreset,
}

impl CallMode {
    /// Numeric code used by the host's notifier
    pub fn code(self) -> u8 {
        match self {
            CallMode::Button => 2,
            CallMode::ButtonPreset => 12,
        }
    }
}

/// The LED renderer and its effect/palette tables
pub trait LedStrip {
    fn mode_count(&self) -> usize;

    fn palette_count(&self) -> usize;

    /// Effect names, once the effect table is registered
    fn mode_names(&self) -> Option<&NameCatalogue>;

    /// Encoded palette catalogue, e.g. `["Default","* Random Cycle",...]`
    fn palette_catalogue(&self) -> Option<&str>;

    fn current_mode_id(&self) -> usize;

    fn current_palette_id(&self) -> usize;

    /// A frame is being pushed to the LEDs
    fn is_updating(&self) -> bool;
}

/// Stored presets
pub trait PresetStore {
    /// Load the next (or previous) preset within the step's band.
    /// Wrap-around at the band edges is the store's decision.
    fn cycle_within_band(&mut self, step: PresetStep, cause: CallMode);
}

/// Broadcasts state changes to the other UIs
pub trait Notifier {
    /// Always called after a lamp update
    fn state_updated(&mut self, cause: CallMode);

    /// Push the new state to connected interfaces
    fn update_interfaces(&mut self, cause: CallMode);

    /// Timestamp (ms) of the last interface broadcast, owned by the host
    fn last_interface_update(&self) -> u64;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn millis(&self) -> u64;
}

/// Everything the controller needs from its host
pub trait Host: LedStrip + PresetStore + Notifier + Clock {}

impl<T> Host for T where T: LedStrip + PresetStore + Notifier + Clock {}
