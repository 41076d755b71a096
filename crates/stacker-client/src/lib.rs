//! # Stacker Behavior Layer
//!
//! Master-side pick-and-place behavior on top of [`stacker_link`]: the
//! color-keyed shelf map and the cycle sequencer that drives a motion node
//! through Init, Pick, GoPlace and Place.

pub mod color;
pub mod sequencer;
pub mod shelf;

pub use color::{ColorId, ColorSensor};
pub use sequencer::{SeqStep, Sequencer};
pub use shelf::{ROW_HEIGHTS_MM, ShelfMap};
