//! # Stacker Motion Node
//!
//! Core of the motion-node firmware: interrupt-driven quadrature counters,
//! the ICD register transport, the closed-loop motion/lift/grip controllers
//! and the safety state machine that ties them together.
//!
//! Three execution contexts overlap here: the cooperative control loop
//! ([`MotionNode::tick`]), the encoder edge handlers ([`EncoderBank`]) and
//! the bus callbacks ([`RegisterTransport`]). Every piece of state shared
//! across contexts lives behind an [`IrqCell`], the explicit
//! masked-critical-section accessor; nothing wider than the platform's
//! atomic width is ever read outside one.

pub mod cell;
pub mod encoder;
pub mod hw;
pub mod motion;
pub mod regbank;
pub mod transport;

#[cfg(feature = "mock")]
pub mod bench;

#[cfg(feature = "mock")]
pub use bench::{BenchActuators, BenchSensors};
pub use cell::IrqCell;
pub use encoder::{EncoderBank, EncoderSnapshot, QuadratureDecoder};
pub use hw::{Actuators, Sensors, ServoChannel};
pub use motion::{DriveModel, MotionController, MotionNode};
pub use regbank::{NodeState, RegBank};
pub use transport::RegisterTransport;
