//! # Stacker Master Link
//!
//! Master-side view of a motion node: typed register reads and writes over
//! any [`stacker_bus::I2cMaster`], with fallback-clock hysteresis and
//! per-register diagnostics. One [`I2cLink`] per node.

mod error;
mod link;

pub use error::LinkError;
pub use link::{FALLBACK_HZ_DEFAULT, I2cLink, LinkDiagnostics, PRIMARY_HZ_DEFAULT};
