//! Part colors and the vision boundary.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Color classes the sorter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ColorId {
    /// Nothing detected, or the classifier gave up.
    #[default]
    None = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Yellow = 4,
    White = 5,
    Black = 6,
}

/// Source of color classifications for picked parts.
///
/// Implementations range from a real camera pipeline to a scripted test
/// double; the sequencer samples it exactly once per pick.
pub trait ColorSensor: Send {
    fn detect_color(&mut self) -> ColorId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_codes_are_stable() {
        assert_eq!(u8::from(ColorId::None), 0);
        assert_eq!(u8::from(ColorId::Red), 1);
        assert_eq!(u8::from(ColorId::Black), 6);
        assert_eq!(ColorId::try_from(4u8).unwrap(), ColorId::Yellow);
        assert!(ColorId::try_from(7u8).is_err());
    }
}
