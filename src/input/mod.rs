mod decoder;
mod handler;

pub use decoder::{QuadratureDecoder, Rotation};
pub use handler::{PresetBand, PresetStep, PresetStepController};
