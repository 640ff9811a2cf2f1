use serde_json::json;
use tracing::debug;

use super::decoder::Rotation;
use crate::device::{Level, MAX_PRESET};

/// Inclusive range of preset ids the encoder cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetBand {
    low: u8,
    high: u8,
}

impl PresetBand {
    /// Create a band, clamping both bounds to `MAX_PRESET`
    pub fn new(low: u8, high: u8) -> Self {
        Self {
            low: low.min(MAX_PRESET),
            high: high.min(MAX_PRESET),
        }
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    /// Both bounds set and strictly ordered
    pub fn is_active(&self) -> bool {
        self.low > 0 && self.high > 0 && self.high > self.low
    }
}

/// Command to the preset store: move one position within `[low, high]`.
///
/// Wrap-around at the band edges is up to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetStep {
    pub forward: bool,
    pub low: u8,
    pub high: u8,
}

impl PresetStep {
    /// Compact cycle directive, e.g. `2~5~` forward or `2~5~-` backward
    pub fn directive(&self) -> String {
        format!(
            "{}~{}~{}",
            self.low,
            self.high,
            if self.forward { "" } else { "-" }
        )
    }

    /// State object carrying the directive under `ps`
    pub fn to_state(&self) -> serde_json::Value {
        json!({ "ps": self.directive() })
    }
}

/// Turns decoder events and switch presses into preset steps
#[derive(Debug, Clone)]
pub struct PresetStepController {
    move_forward: bool,
    button_prev: Level,
}

impl Default for PresetStepController {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetStepController {
    pub fn new() -> Self {
        Self {
            move_forward: true,
            button_prev: Level::High,
        }
    }

    /// Direction the next press will step in
    pub fn move_forward(&self) -> bool {
        self.move_forward
    }

    /// Process one polling tick.
    ///
    /// The press edge is evaluated before the rotation of the same tick, so a
    /// press coincident with a detent steps in the previous direction.
    pub fn tick(&mut self, rotation: Rotation, switch: Level, band: PresetBand) -> Option<PresetStep> {
        let mut step = None;

        if switch != self.button_prev {
            if switch.is_low() {
                if band.is_active() {
                    step = Some(PresetStep {
                        forward: self.move_forward,
                        low: band.low(),
                        high: band.high(),
                    });
                } else {
                    debug!(
                        "Press ignored, preset band {}..{} inactive",
                        band.low(),
                        band.high()
                    );
                }
            }
            self.button_prev = switch;
        }

        match rotation {
            Rotation::Clockwise => self.move_forward = true,
            Rotation::CounterClockwise => self.move_forward = false,
            Rotation::None => {}
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Level::{High as H, Low as L};
    use crate::input::decoder::QuadratureDecoder;

    /// One tick of pin levels: (A, B, SW)
    type Sample = (Level, Level, Level);

    fn replay(trace: &[Sample], band: PresetBand) -> (Vec<PresetStep>, PresetStepController) {
        let mut decoder = QuadratureDecoder::new();
        let mut controller = PresetStepController::new();
        let mut steps = Vec::new();
        for &(a, b, sw) in trace {
            let rotation = decoder.update(a, b);
            if let Some(step) = controller.tick(rotation, sw, band) {
                steps.push(step);
            }
        }
        (steps, controller)
    }

    fn idle(n: usize) -> Vec<Sample> {
        vec![(H, L, H); n]
    }

    fn band() -> PresetBand {
        PresetBand::new(2, 5)
    }

    fn press() -> Vec<Sample> {
        vec![(H, L, L), (H, L, H)]
    }

    #[test]
    fn test_band_activity() {
        assert!(PresetBand::new(2, 5).is_active());
        assert!(!PresetBand::new(0, 5).is_active());
        assert!(!PresetBand::new(2, 0).is_active());
        assert!(!PresetBand::new(5, 5).is_active());
        assert!(!PresetBand::new(6, 5).is_active());
    }

    #[test]
    fn test_band_clamps_to_max_preset() {
        let band = PresetBand::new(251, 255);
        assert_eq!(band.low(), 250);
        assert_eq!(band.high(), 250);
        assert!(!band.is_active());
    }

    #[test]
    fn test_directive_format() {
        let forward = PresetStep { forward: true, low: 2, high: 5 };
        let backward = PresetStep { forward: false, low: 2, high: 5 };
        assert_eq!(forward.directive(), "2~5~");
        assert_eq!(backward.directive(), "2~5~-");
        assert_eq!(backward.to_state(), json!({ "ps": "2~5~-" }));
    }

    #[test]
    fn test_no_motion_no_press() {
        let (steps, controller) = replay(&idle(1000), band());
        assert!(steps.is_empty());
        assert!(controller.move_forward());
    }

    #[test]
    fn test_clockwise_detent_then_press() {
        let mut trace = vec![(H, L, H), (L, L, H)];
        trace.extend(idle(10));
        trace.extend(press());

        let (steps, _) = replay(&trace, band());
        assert_eq!(steps, vec![PresetStep { forward: true, low: 2, high: 5 }]);
    }

    #[test]
    fn test_counter_clockwise_detent_then_press() {
        let mut trace = vec![(H, H, H), (L, H, H)];
        trace.extend(idle(10));
        trace.extend(press());

        let (steps, _) = replay(&trace, band());
        assert_eq!(steps, vec![PresetStep { forward: false, low: 2, high: 5 }]);
    }

    #[test]
    fn test_press_without_motion_defaults_forward() {
        let (steps, _) = replay(&press(), band());
        assert_eq!(steps.len(), 1);
        assert!(steps[0].forward);
    }

    #[test]
    fn test_double_press_with_reversal() {
        let mut trace = press();
        trace.extend([(H, H, H), (L, H, H), (H, H, H)]);
        trace.extend(press());

        let (steps, _) = replay(&trace, band());
        assert_eq!(steps.len(), 2);
        assert!(steps[0].forward);
        assert!(!steps[1].forward);
    }

    #[test]
    fn test_second_press_reuses_direction() {
        let mut trace = vec![(H, H, H), (L, H, H)];
        trace.extend(press());
        trace.extend(press());

        let (steps, _) = replay(&trace, band());
        assert_eq!(steps.len(), 2);
        assert!(steps.iter().all(|s| !s.forward));
    }

    #[test]
    fn test_inactive_band_suppresses_steps_but_tracks_direction() {
        let mut trace = press();
        trace.extend([(H, H, H), (L, H, H)]);
        trace.extend(press());

        for inactive in [PresetBand::new(0, 0), PresetBand::new(5, 2), PresetBand::new(0, 5)] {
            let (steps, controller) = replay(&trace, inactive);
            assert!(steps.is_empty());
            assert!(!controller.move_forward());
        }
    }

    #[test]
    fn test_held_button_fires_once() {
        let mut trace = vec![(H, L, L); 20];
        trace.push((H, L, H));
        let (steps, _) = replay(&trace, band());
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_press_and_detent_in_same_tick_use_previous_direction() {
        let mut controller = PresetStepController::new();
        let step = controller
            .tick(Rotation::CounterClockwise, L, band())
            .unwrap();
        assert!(step.forward);
        assert!(!controller.move_forward());
    }
}
