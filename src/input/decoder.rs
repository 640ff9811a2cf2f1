//! Polled quadrature decoding for a two-phase mechanical encoder.
//!
//! One event is recognised per detent: on the falling edge of phase A the
//! level of phase B gives the direction. Contact bounce that leaves A high,
//! or that re-enters low without A having returned high first, produces no
//! event.

use crate::device::{Gpio, Level, PinAdapter, PinRegistry};

/// Result of one decoder poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    /// B low at the falling edge of A: next preset
    Clockwise,
    /// B high at the falling edge of A: previous preset
    CounterClockwise,
}

#[derive(Debug, Clone, Default)]
pub struct QuadratureDecoder {
    a_prev: Option<Level>,
}

impl QuadratureDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the previous A level so the first poll cannot fire
    pub fn prime(&mut self, a: Level) {
        self.a_prev = Some(a);
    }

    /// Sample A then B from the adapter. An inactive adapter yields `None`.
    pub fn poll<G, R>(&mut self, pins: &PinAdapter<G, R>) -> Rotation
    where
        G: Gpio,
        R: PinRegistry,
    {
        if !pins.is_active() {
            return Rotation::None;
        }
        let a = pins.read_phase_a();
        let b = pins.read_phase_b();
        self.update(a, b)
    }

    /// Feed one (A, B) sample. B is not latched between samples.
    pub fn update(&mut self, a: Level, b: Level) -> Rotation {
        let prev = self.a_prev.replace(a);
        match (prev, a) {
            (Some(Level::High), Level::Low) if b.is_low() => Rotation::Clockwise,
            (Some(Level::High), Level::Low) => Rotation::CounterClockwise,
            _ => Rotation::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Level::{High as H, Low as L};

    fn run(trace: &[(Level, Level)]) -> Vec<Rotation> {
        let mut decoder = QuadratureDecoder::new();
        trace
            .iter()
            .map(|&(a, b)| decoder.update(a, b))
            .filter(|r| *r != Rotation::None)
            .collect()
    }

    #[test]
    fn test_no_falling_edge_no_events() {
        let trace = vec![(H, L); 1000];
        assert!(run(&trace).is_empty());

        // Rising edges and B activity alone never fire
        let trace = [(L, L), (H, L), (H, H), (H, L), (H, H)];
        assert!(run(&trace).is_empty());
    }

    #[test]
    fn test_clockwise_on_b_low() {
        assert_eq!(run(&[(H, L), (L, L)]), vec![Rotation::Clockwise]);
    }

    #[test]
    fn test_counter_clockwise_on_b_high() {
        assert_eq!(run(&[(H, H), (L, H)]), vec![Rotation::CounterClockwise]);
    }

    #[test]
    fn test_first_sample_low_is_not_an_edge() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(decoder.update(L, L), Rotation::None);
    }

    #[test]
    fn test_prime_suppresses_power_on_event() {
        let mut decoder = QuadratureDecoder::new();
        decoder.prime(L);
        assert_eq!(decoder.update(L, L), Rotation::None);

        let mut decoder = QuadratureDecoder::new();
        decoder.prime(H);
        assert_eq!(decoder.update(L, H), Rotation::CounterClockwise);
    }

    #[test]
    fn test_repeated_polls_without_new_edge() {
        let mut decoder = QuadratureDecoder::new();
        decoder.prime(H);
        assert_eq!(decoder.update(L, L), Rotation::Clockwise);
        for _ in 0..50 {
            assert_eq!(decoder.update(L, L), Rotation::None);
        }
    }

    #[test]
    fn test_k_edges_give_k_events_in_order() {
        let trace = [
            (H, L),
            (L, L), // cw
            (L, H),
            (H, H),
            (L, H), // ccw
            (L, L),
            (H, L),
            (H, L),
            (L, L), // cw
        ];
        assert_eq!(
            run(&trace),
            vec![
                Rotation::Clockwise,
                Rotation::CounterClockwise,
                Rotation::Clockwise
            ]
        );
    }

    #[test]
    fn test_bounce_while_low_is_dropped() {
        // A stays low while B chatters: only the first edge counts
        let trace = [(H, L), (L, L), (L, H), (L, L), (L, H)];
        assert_eq!(run(&trace), vec![Rotation::Clockwise]);
    }
}
