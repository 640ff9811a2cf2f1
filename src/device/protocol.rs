//! Encoder wiring and timing constants
//!
//! Pin defaults match the reference wiring of the guitar controller board:
//!   - DT  (phase A) → GPIO 18
//!   - CLK (phase B) → GPIO 19
//!   - SW  (switch)  → GPIO 5
//!
//! Timing is expressed in milliseconds of the host's monotonic clock.

/// Default GPIO for the encoder DT line (phase A)
pub const DEFAULT_DT_PIN: i8 = 18;

/// Default GPIO for the encoder CLK line (phase B)
pub const DEFAULT_CLK_PIN: i8 = 19;

/// Default GPIO for the encoder push switch
pub const DEFAULT_SW_PIN: i8 = 5;

/// Polling period for the encoder (2ms = 500Hz)
pub const POLL_INTERVAL_MS: u64 = 2;

/// While the strip is rendering, ticks closer than this are skipped
pub const BUSY_YIELD_MS: u64 = 4;

/// Minimum gap between interface broadcasts after a lamp update
pub const INTERFACE_UPDATE_COOLDOWN: u64 = 1000;

/// Highest preset id the band may reference.
///
/// This is a product limit on stored presets, not a storage limit of `u8`.
pub const MAX_PRESET: u8 = 250;

/// Number of effects at the start of the list kept in catalogue order
pub const MODE_SORT_SKIP_COUNT: usize = 1;

/// Stable user-module id advertised to the host
pub const USERMOD_ID_GUITAR_LED: u16 = 47;

/// Name of the top-level config object
pub const CONFIG_NAME: &str = "Guitar-Led";
