//! Error types for the controller

use thiserror::Error;

use crate::catalogue::CatalogueError;

/// Errors surfaced by setup, reconfiguration and config file handling
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Phase A or phase B is not connected
    #[error("invalid encoder pins (DT {pin_a}, CLK {pin_b})")]
    InvalidPins { pin_a: i8, pin_b: i8 },

    /// The pin registry refused the atomic allocation
    #[error("failed to allocate GPIO pins {pins:?}")]
    PinAllocation { pins: Vec<u8> },

    #[error("name catalogue: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
