mod manager;
mod pins;
mod protocol;
mod scripted;

pub use manager::{PinAdapter, OWNER};
pub use pins::{Gpio, Level, OwnerTag, PinConfig, PinRegistry};
pub use protocol::*;
pub use scripted::{MemoryPinRegistry, ScriptedGpio};
