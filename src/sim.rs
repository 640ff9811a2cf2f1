//! Simulated lighting host and encoder traces
//!
//! Lets the controller run off-device: `SimHost` stands in for the strip,
//! the preset store and the notifier, and a trace file scripts the encoder
//! pins one polling tick per line.

use thiserror::Error;
use tracing::info;

use crate::catalogue::NameCatalogue;
use crate::device::Level;
use crate::host::{CallMode, Clock, LedStrip, Notifier, PresetStore};
use crate::input::PresetStep;

/// Effect names in firmware order; "Solid" stays first in the sorted view
pub const DEFAULT_MODE_NAMES: &[&str] = &[
    "Solid",
    "Blink",
    "Breathe",
    "Wipe",
    "Wipe Random",
    "Random Colors",
    "Sweep",
    "Dynamic",
    "Colorloop",
    "Rainbow",
    "Scan",
    "Scan Dual",
    "Fade",
    "Theater",
    "Theater Rainbow",
    "Running",
    "Saw",
    "Twinkle",
    "Dissolve",
    "Dissolve Rnd",
    "Sparkle",
    "Strobe",
    "Android",
    "Chase",
    "Fireworks",
    "Rain",
    "Fire 2012",
    "Colorwaves",
    "BPM",
    "Fill Noise",
    "Meteor",
    "Ripple",
    "Aurora",
];

/// Palette catalogue as the firmware encodes it
pub const DEFAULT_PALETTES: &str = r#"["Default","* Random Cycle","* Color 1","* Colors 1&2","* Color Gradient","* Colors Only","Party","Cloud","Lava","Ocean","Forest","Rainbow","Rainbow Bands","Sunset","Rivendell","Breeze","Red & Blue","Yellowout","Analogous","Splash","Pastel","Sunset 2","Beach","Vintage","Departure","Landscape","Beech","Sherbet","Hult","Hult 64","Drywet","Jul","Grintage","Rewhi","Tertiary","Fire","Icefire","Cyane","Light Pink","Autumn","Magenta","Magred","Yelmag","Yelblu","Orange & Teal","Tiamat","April Night","Orangery","C9","Sakura","Aurora","Atlantica"]"#;

/// In-memory strip, preset store, notifier and clock
#[derive(Debug, Clone)]
pub struct SimHost {
    modes: Option<NameCatalogue>,
    palettes: Option<String>,
    palette_count: usize,
    current_mode: usize,
    current_palette: usize,
    updating: bool,
    now: u64,
    preset: Option<u8>,
    steps: Vec<PresetStep>,
    state_updates: usize,
    broadcasts: usize,
    last_interface_update: u64,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// Host with the built-in effect and palette catalogues
    pub fn new() -> Self {
        let mut host = Self::without_catalogues();
        host.publish_catalogues(NameCatalogue::from_names(DEFAULT_MODE_NAMES), DEFAULT_PALETTES);
        host
    }

    /// Host whose strip has not registered any effects yet
    pub fn without_catalogues() -> Self {
        Self {
            modes: None,
            palettes: None,
            palette_count: 0,
            current_mode: 0,
            current_palette: 0,
            updating: false,
            now: 0,
            preset: None,
            steps: Vec::new(),
            state_updates: 0,
            broadcasts: 0,
            last_interface_update: 0,
        }
    }

    /// Replace both catalogues
    pub fn publish_catalogues(&mut self, modes: NameCatalogue, palettes: &str) {
        self.palette_count = NameCatalogue::parse(palettes).map(|c| c.len()).unwrap_or(0);
        self.modes = Some(modes);
        self.palettes = Some(palettes.to_string());
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }

    /// Change the selection as another interface would
    pub fn select(&mut self, mode: usize, palette: usize) {
        self.current_mode = mode;
        self.current_palette = palette;
    }

    pub fn preset(&self) -> Option<u8> {
        self.preset
    }

    /// Every step the store received, in order
    pub fn steps(&self) -> &[PresetStep] {
        &self.steps
    }

    pub fn state_updates(&self) -> usize {
        self.state_updates
    }

    pub fn broadcasts(&self) -> usize {
        self.broadcasts
    }
}

impl LedStrip for SimHost {
    fn mode_count(&self) -> usize {
        self.modes.as_ref().map(NameCatalogue::len).unwrap_or(0)
    }

    fn palette_count(&self) -> usize {
        self.palette_count
    }

    fn mode_names(&self) -> Option<&NameCatalogue> {
        self.modes.as_ref()
    }

    fn palette_catalogue(&self) -> Option<&str> {
        self.palettes.as_deref()
    }

    fn current_mode_id(&self) -> usize {
        self.current_mode
    }

    fn current_palette_id(&self) -> usize {
        self.current_palette
    }

    fn is_updating(&self) -> bool {
        self.updating
    }
}

impl PresetStore for SimHost {
    /// Step within the band, wrapping at both ends. From outside the band a
    /// forward step lands on `low` and a backward step on `high`.
    fn cycle_within_band(&mut self, step: PresetStep, cause: CallMode) {
        let next = match self.preset {
            Some(p) if (step.low..=step.high).contains(&p) => {
                if step.forward {
                    if p >= step.high { step.low } else { p + 1 }
                } else if p <= step.low {
                    step.high
                } else {
                    p - 1
                }
            }
            _ if step.forward => step.low,
            _ => step.high,
        };

        info!("Loading preset {} ({}, mode {})", next, step.to_state(), cause.code());
        self.preset = Some(next);
        self.steps.push(step);

        // A preset brings its own effect along
        let modes = self.mode_count();
        if modes > 0 {
            self.current_mode = next as usize % modes;
        }
    }
}

impl Notifier for SimHost {
    fn state_updated(&mut self, _cause: CallMode) {
        self.state_updates += 1;
    }

    fn update_interfaces(&mut self, _cause: CallMode) {
        self.broadcasts += 1;
        self.last_interface_update = self.now;
    }

    fn last_interface_update(&self) -> u64 {
        self.last_interface_update
    }
}

impl Clock for SimHost {
    fn millis(&self) -> u64 {
        self.now
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Pin levels for one or more consecutive polling ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSample {
    pub a: Level,
    pub b: Level,
    pub switch: Level,
    pub repeat: usize,
}

fn parse_level(token: &str) -> Option<Level> {
    match token {
        "1" | "H" | "h" => Some(Level::High),
        "0" | "L" | "l" => Some(Level::Low),
        _ => None,
    }
}

/// Parse a trace: one `A B SW [xN]` line per tick, `#` starts a comment.
///
/// ```text
/// # clockwise detent, then press
/// 1 0 1
/// 0 0 1
/// 1 0 1 x10
/// 1 0 0
/// 1 0 1
/// ```
pub fn parse_trace(text: &str) -> Result<Vec<TraceSample>, TraceError> {
    let mut samples = Vec::new();

    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 3 || tokens.len() > 4 {
            return Err(TraceError::Parse {
                line,
                reason: format!("expected `A B SW [xN]`, got {:?}", content),
            });
        }

        let level = |token: &str| {
            parse_level(token).ok_or_else(|| TraceError::Parse {
                line,
                reason: format!("bad level {:?}", token),
            })
        };
        let repeat = match tokens.get(3) {
            Some(token) => token
                .strip_prefix('x')
                .and_then(|count| count.parse::<usize>().ok())
                .filter(|count| *count > 0)
                .ok_or_else(|| TraceError::Parse {
                    line,
                    reason: format!("bad repeat {:?}", token),
                })?,
            None => 1,
        };

        samples.push(TraceSample {
            a: level(tokens[0])?,
            b: level(tokens[1])?,
            switch: level(tokens[2])?,
            repeat,
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(forward: bool) -> PresetStep {
        PresetStep { forward, low: 2, high: 5 }
    }

    #[test]
    fn test_default_catalogues_parse() {
        let host = SimHost::new();
        assert_eq!(host.mode_count(), DEFAULT_MODE_NAMES.len());
        assert_eq!(host.palette_count(), 52);
        assert_eq!(host.mode_names().and_then(|m| m.name(0)), Some("Solid"));
    }

    #[test]
    fn test_store_wraps_within_band() {
        let mut host = SimHost::new();
        host.cycle_within_band(step(true), CallMode::ButtonPreset);
        assert_eq!(host.preset(), Some(2));

        for _ in 0..3 {
            host.cycle_within_band(step(true), CallMode::ButtonPreset);
        }
        assert_eq!(host.preset(), Some(5));
        host.cycle_within_band(step(true), CallMode::ButtonPreset);
        assert_eq!(host.preset(), Some(2));

        host.cycle_within_band(step(false), CallMode::ButtonPreset);
        assert_eq!(host.preset(), Some(5));
        assert_eq!(host.steps().len(), 6);
    }

    #[test]
    fn test_store_enters_band_from_outside() {
        let mut host = SimHost::new();
        host.cycle_within_band(step(false), CallMode::ButtonPreset);
        assert_eq!(host.preset(), Some(5));
    }

    #[test]
    fn test_broadcast_records_time() {
        let mut host = SimHost::new();
        host.advance(1500);
        host.update_interfaces(CallMode::Button);
        assert_eq!(host.last_interface_update(), 1500);
        assert_eq!(host.broadcasts(), 1);
    }

    #[test]
    fn test_parse_trace() {
        let text = "# cw detent\n1 0 1\n0 0 1  # edge\n\nH L H x10\n1 0 0\n";
        let samples = parse_trace(text).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[1].a, Level::Low);
        assert_eq!(samples[2].repeat, 10);
        assert_eq!(samples[3].switch, Level::Low);
    }

    #[test]
    fn test_parse_trace_errors() {
        assert!(matches!(
            parse_trace("1 0\n"),
            Err(TraceError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_trace("1 0 1\n1 2 1\n"),
            Err(TraceError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_trace("1 0 1 x0\n"),
            Err(TraceError::Parse { line: 1, .. })
        ));
    }
}
