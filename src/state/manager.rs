use tracing::debug;

use crate::catalogue::AlphaIndex;

/// Where the strip's current effect and palette sit in the sorted views.
///
/// The strip can change its selection behind our back (web UI, presets), so
/// the cached positions are checked every tick and re-resolved when stale.
#[derive(Debug, Clone, Default)]
pub struct SelectionShadow {
    initialized: bool,
    /// Position of the current effect in the sorted effect view
    pub effect_index: usize,
    /// Position of the current palette in the sorted palette view
    pub palette_index: usize,
    /// Last effect id seen on the strip
    pub known_mode: usize,
    /// Last palette id seen on the strip
    pub known_palette: usize,
}

impl SelectionShadow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Force a re-scan on the next refresh
    pub fn invalidate(&mut self) {
        self.initialized = false;
    }

    /// Locate both ids in the sorted views.
    ///
    /// An id that is not found keeps its previous index and leaves the
    /// shadow uninitialized so the next refresh tries again.
    pub fn resolve(&mut self, modes: &AlphaIndex, palettes: &AlphaIndex, mode_id: usize, palette_id: usize) {
        self.known_mode = mode_id;
        self.known_palette = palette_id;

        let effect = modes.locate(mode_id);
        let palette = palettes.locate(palette_id);
        if let Some(index) = effect {
            self.effect_index = index;
        }
        if let Some(index) = palette {
            self.palette_index = index;
        }
        self.initialized = effect.is_some() && palette.is_some();
    }

    /// True when the remembered positions no longer map to the given ids
    pub fn is_stale(&self, modes: &AlphaIndex, palettes: &AlphaIndex, mode_id: usize, palette_id: usize) -> bool {
        modes.is_stale(self.effect_index, mode_id) || palettes.is_stale(self.palette_index, palette_id)
    }

    /// Per-tick maintenance: resolve if needed, then mark stale on mismatch
    pub fn refresh(&mut self, modes: &AlphaIndex, palettes: &AlphaIndex, mode_id: usize, palette_id: usize) {
        if !self.initialized {
            self.resolve(modes, palettes, mode_id, palette_id);
            return;
        }
        if self.is_stale(modes, palettes, mode_id, palette_id) {
            debug!(
                "Selection changed (effect {} -> {}, palette {} -> {})",
                self.known_mode, mode_id, self.known_palette, palette_id
            );
            self.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::NameCatalogue;

    fn views() -> (AlphaIndex, AlphaIndex) {
        let modes = NameCatalogue::from_names(["Solid", "Zebra", "Aurora"]);
        let palettes = NameCatalogue::from_names(["Default", "*Rand", "Blue", "aqua"]);
        (
            AlphaIndex::rebuild(&modes, 3, 1),
            AlphaIndex::rebuild(&palettes, 4, 2),
        )
    }

    #[test]
    fn test_resolve_finds_positions() {
        let (modes, palettes) = views();
        let mut shadow = SelectionShadow::new();
        shadow.resolve(&modes, &palettes, 1, 2);

        assert!(shadow.is_initialized());
        assert_eq!(shadow.effect_index, 2); // Zebra after Aurora
        assert_eq!(shadow.palette_index, 3); // Blue after aqua
        assert_eq!(shadow.known_mode, 1);
        assert_eq!(shadow.known_palette, 2);
    }

    #[test]
    fn test_external_change_marks_stale_then_resolves() {
        let (modes, palettes) = views();
        let mut shadow = SelectionShadow::new();
        shadow.refresh(&modes, &palettes, 1, 2);
        assert!(shadow.is_initialized());

        // Same selection: nothing to do
        shadow.refresh(&modes, &palettes, 1, 2);
        assert!(shadow.is_initialized());

        // Effect changed elsewhere
        shadow.refresh(&modes, &palettes, 2, 2);
        assert!(!shadow.is_initialized());
        assert_eq!(shadow.effect_index, 2);

        shadow.refresh(&modes, &palettes, 2, 2);
        assert!(shadow.is_initialized());
        assert_eq!(shadow.effect_index, 1);
    }

    #[test]
    fn test_unknown_id_keeps_index_and_retries() {
        let (modes, palettes) = views();
        let mut shadow = SelectionShadow::new();
        shadow.resolve(&modes, &palettes, 1, 2);

        shadow.resolve(&modes, &palettes, 99, 3);
        assert!(!shadow.is_initialized());
        assert_eq!(shadow.effect_index, 2);
        assert_eq!(shadow.palette_index, 2);
        assert_eq!(shadow.known_mode, 99);
    }
}
