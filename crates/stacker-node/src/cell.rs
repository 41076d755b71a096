//! Masked-critical-section accessor for ISR-shared state.

use parking_lot::Mutex;

/// Interrupt-safe cell for state shared between the control loop and
/// asynchronous handlers (encoder edges, bus callbacks).
///
/// On the target this compiles down to an interrupts-masked section; on the
/// host it is a short uncontended mutex. Either way the only access path is
/// [`IrqCell::masked`], so a torn multi-byte read/write cannot straddle a
/// handler by construction. Keep the closures short: the section delays
/// every interrupt source on the node.
pub struct IrqCell<T> {
    inner: Mutex<T>,
}

impl<T> IrqCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Run `f` with interrupts masked.
    pub fn masked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<T: Default> Default for IrqCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_access_reads_consistent_value() {
        let cell = IrqCell::new((1u32, 2u32));
        cell.masked(|v| {
            v.0 = 10;
            v.1 = 20;
        });
        let snap = cell.masked(|v| *v);
        assert_eq!(snap, (10, 20));
    }
}
