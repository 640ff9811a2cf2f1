pub mod catalogue;
pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod input;
pub mod sim;
pub mod state;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use catalogue::{palette_skip, AlphaIndex, NameCatalogue};
use config::ControllerConfig;
use device::{
    Gpio, PinAdapter, PinRegistry, BUSY_YIELD_MS, CONFIG_NAME, INTERFACE_UPDATE_COOLDOWN,
    MODE_SORT_SKIP_COUNT, OWNER, POLL_INTERVAL_MS, USERMOD_ID_GUITAR_LED,
};
use host::{CallMode, Host};
use input::{PresetStep, PresetStepController, QuadratureDecoder};
use state::SelectionShadow;

pub use error::{ControllerError, Result};

/// Effect and palette catalogues with their alphabetical permutations
struct SortedViews {
    modes: NameCatalogue,
    palettes: NameCatalogue,
    mode_order: AlphaIndex,
    palette_order: AlphaIndex,
}

/// Encoder-driven preset selector.
///
/// Rotating the encoder picks a direction; pressing its switch steps to the
/// next or previous preset within the configured band. The host calls
/// [`tick`](Self::tick) as often as it can.
pub struct GuitarLedController<G, R, H> {
    config: ControllerConfig,
    pins: PinAdapter<G, R>,
    host: H,
    decoder: QuadratureDecoder,
    steps: PresetStepController,
    shadow: SelectionShadow,
    views: Option<SortedViews>,
    loop_time: u64,
    init_done: bool,
    last_error: Option<ControllerError>,
}

impl<G, R, H> GuitarLedController<G, R, H>
where
    G: Gpio,
    R: PinRegistry,
    H: Host,
{
    /// Create a controller with the default config; nothing is allocated yet
    pub fn new(gpio: G, registry: R, host: H) -> Self {
        let config = ControllerConfig::default();
        let pins = PinAdapter::new(gpio, registry, config.pins());
        Self {
            config,
            pins,
            host,
            decoder: QuadratureDecoder::new(),
            steps: PresetStepController::new(),
            shadow: SelectionShadow::new(),
            views: None,
            loop_time: 0,
            init_done: false,
            last_error: None,
        }
    }

    /// Stable user-module id
    pub fn id(&self) -> u16 {
        USERMOD_ID_GUITAR_LED
    }

    /// Allocate pins, configure inputs and build the sorted views.
    ///
    /// On failure the controller is left disabled holding no pins.
    pub fn setup(&mut self) -> Result<()> {
        info!("Guitar LED controller init");

        let pins = self.config.pins();
        if !pins.is_valid() {
            self.config.enabled = false;
            warn!("Invalid GPIO pins for Guitar LED controller: {:?}", pins);
            return Err(ControllerError::InvalidPins {
                pin_a: pins.pin_a,
                pin_b: pins.pin_b,
            });
        }
        if !self.config.enabled {
            return Ok(());
        }

        self.pins.configure(pins);
        if !self.pins.register_pins(OWNER) {
            self.config.enabled = false;
            self.pins.release_pins();
            error!("Failed to allocate GPIO pins {:?} for Guitar LED controller", pins);
            return Err(ControllerError::PinAllocation {
                pins: pins.connected(),
            });
        }

        self.loop_time = self.host.millis();

        if !self.init_done {
            if let Err(e) = self.rebuild_views() {
                warn!("Could not sort effects and palettes: {}", e);
                self.last_error = Some(e);
            }
        }
        self.init_done = true;

        self.decoder.prime(self.pins.read_phase_a());
        info!("Guitar LED setup completed");
        Ok(())
    }

    /// Polling entry point, called by the host loop
    pub fn tick(&mut self) {
        if !self.config.enabled || !self.pins.is_active() {
            return;
        }

        let now = self.host.millis();
        let elapsed = now.saturating_sub(self.loop_time);
        if self.host.is_updating() && elapsed < BUSY_YIELD_MS {
            return;
        }

        if elapsed >= POLL_INTERVAL_MS {
            self.loop_time = now;

            // Switch first, then phases: a press in the same tick as a detent
            // steps in the direction chosen before that detent.
            let switch = self.pins.read_switch();
            let rotation = self.decoder.poll(&self.pins);
            if let Some(step) = self.steps.tick(rotation, switch, self.config.band()) {
                self.change_preset(step);
            }
        }

        self.update_shadow();
    }

    /// Release pins and drop the sorted views
    pub fn teardown(&mut self) {
        self.pins.release_pins();
        self.views = None;
        self.shadow.invalidate();
        self.init_done = false;
        debug!("Guitar LED controller torn down");
    }

    /// Rebuild both sorted views from the strip's current catalogues
    pub fn catalogue_changed(&mut self) -> Result<()> {
        self.rebuild_views().map(|_| ())
    }

    /// Write our section into the host config root
    pub fn add_to_config(&self, root: &mut Value) {
        if !root.is_object() {
            *root = Value::Object(Map::new());
        }
        if let Some(obj) = root.as_object_mut() {
            obj.insert(CONFIG_NAME.to_string(), self.config.to_json());
        }
        debug!("Guitar LED config saved");
    }

    /// Read our section from the host config root.
    ///
    /// Returns true if the stored config includes the preset band keys.
    /// Before setup only values are stored; afterwards a pin change moves the
    /// allocation atomically, keeping the old pins if the new ones are taken.
    pub fn read_from_config(&mut self, root: &Value) -> bool {
        let top = match ControllerConfig::section(root) {
            Some(top) => top,
            None => {
                debug!("{}: No config found. (Using defaults.)", CONFIG_NAME);
                return false;
            }
        };

        let mut next = self.config.clone();
        next.apply_json(top);
        let has_band = ControllerConfig::has_band_keys(top);

        if !self.init_done {
            self.pins.configure(next.pins());
            self.config = next;
            debug!("{} config loaded", CONFIG_NAME);
            return has_band;
        }
        debug!("{} config (re)loaded", CONFIG_NAME);

        let old_pins = self.config.pins();
        let new_pins = next.pins();
        self.config = ControllerConfig {
            dt_pin: old_pins.pin_a,
            clk_pin: old_pins.pin_b,
            sw_pin: old_pins.pin_c,
            ..next
        };

        if new_pins != old_pins {
            if !new_pins.is_valid() {
                self.pins.release_pins();
                self.pins.configure(new_pins);
                self.set_pins(new_pins);
                self.config.enabled = false;
                return has_band;
            }

            if !self.config.enabled {
                self.pins.release_pins();
                self.pins.configure(new_pins);
                self.set_pins(new_pins);
                return has_band;
            }

            if self.pins.is_active() {
                match self.pins.reconfigure(new_pins) {
                    Ok(()) => {
                        self.set_pins(new_pins);
                        self.decoder.prime(self.pins.read_phase_a());
                    }
                    Err(e) => {
                        warn!("Keeping encoder pins {:?}: {}", old_pins, e);
                        self.last_error = Some(e);
                    }
                }
                return has_band;
            }

            self.pins.configure(new_pins);
            self.set_pins(new_pins);
        }

        if self.config.enabled && !self.pins.is_active() {
            if let Err(e) = self.setup() {
                warn!("Guitar LED setup after reconfigure failed: {}", e);
                self.last_error = Some(e);
            }
        }

        has_band
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn pins(&self) -> &PinAdapter<G, R> {
        &self.pins
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Direction the next press will step in
    pub fn move_forward(&self) -> bool {
        self.steps.move_forward()
    }

    /// Most recent error that was logged instead of returned
    pub fn last_error(&self) -> Option<&ControllerError> {
        self.last_error.as_ref()
    }

    /// Effect ids in display order
    pub fn sorted_modes(&self) -> Option<&AlphaIndex> {
        self.views.as_ref().map(|v| &v.mode_order)
    }

    /// Palette ids in display order
    pub fn sorted_palettes(&self) -> Option<&AlphaIndex> {
        self.views.as_ref().map(|v| &v.palette_order)
    }

    pub fn sorted_mode_names(&self) -> Vec<&str> {
        self.views
            .as_ref()
            .map(|v| v.mode_order.sorted_names(&v.modes).collect())
            .unwrap_or_default()
    }

    pub fn sorted_palette_names(&self) -> Vec<&str> {
        self.views
            .as_ref()
            .map(|v| v.palette_order.sorted_names(&v.palettes).collect())
            .unwrap_or_default()
    }

    /// Position of the current effect in the sorted view, once resolved
    pub fn effect_index(&self) -> Option<usize> {
        self.shadow
            .is_initialized()
            .then_some(self.shadow.effect_index)
    }

    /// Position of the current palette in the sorted view, once resolved
    pub fn palette_index(&self) -> Option<usize> {
        self.shadow
            .is_initialized()
            .then_some(self.shadow.palette_index)
    }

    fn set_pins(&mut self, pins: device::PinConfig) {
        self.config.dt_pin = pins.pin_a;
        self.config.clk_pin = pins.pin_b;
        self.config.sw_pin = pins.pin_c;
    }

    /// Returns false when the strip has not published its catalogues yet
    fn rebuild_views(&mut self) -> Result<bool> {
        let modes = match self.host.mode_names() {
            Some(modes) => modes.clone(),
            None => return Ok(false),
        };
        let palettes = match self.host.palette_catalogue() {
            Some(encoded) => NameCatalogue::parse(encoded)?,
            None => return Ok(false),
        };

        let mode_order = AlphaIndex::rebuild(&modes, self.host.mode_count(), MODE_SORT_SKIP_COUNT);
        let palette_order =
            AlphaIndex::rebuild(&palettes, self.host.palette_count(), palette_skip(&palettes));
        debug!(
            "Sorted {} effects and {} palettes",
            mode_order.len(),
            palette_order.len()
        );

        self.views = Some(SortedViews {
            modes,
            palettes,
            mode_order,
            palette_order,
        });
        self.shadow.invalidate();
        if matches!(self.last_error, Some(ControllerError::Catalogue(_))) {
            self.last_error = None;
        }
        Ok(true)
    }

    fn update_shadow(&mut self) {
        let catalogue_failed = matches!(self.last_error, Some(ControllerError::Catalogue(_)));
        if self.views.is_none() && self.init_done && !catalogue_failed {
            if let Err(e) = self.rebuild_views() {
                warn!("Could not sort effects and palettes: {}", e);
                self.last_error = Some(e);
            }
        }

        if let Some(views) = self.views.as_ref() {
            self.shadow.refresh(
                &views.mode_order,
                &views.palette_order,
                self.host.current_mode_id(),
                self.host.current_palette_id(),
            );
        }
    }

    fn change_preset(&mut self, step: PresetStep) {
        info!(
            "Preset {} within {}..{}",
            if step.forward { "next" } else { "previous" },
            step.low,
            step.high
        );
        self.host.cycle_within_band(step, CallMode::ButtonPreset);
        self.lamp_updated();
    }

    fn lamp_updated(&mut self) {
        self.host.state_updated(CallMode::Button);
        let now = self.host.millis();
        if now.saturating_sub(self.host.last_interface_update()) > INTERFACE_UPDATE_COOLDOWN {
            self.host.update_interfaces(CallMode::Button);
        }
    }
}
