use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide pause switch shared by all producers and the publish path.
///
/// A cloned gate refers to the same underlying flag, so a handle can be
/// passed to every producer/consumer without ambient global state. The flag
/// is read at the moment of use; toggling never discards buffered samples.
#[derive(Clone)]
pub struct PauseGate {
    paused: Arc<AtomicBool>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self) -> bool {
        // fetch_xor(true) flips atomically and returns the previous value.
        !self.paused.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_running() {
        assert!(!PauseGate::new().is_paused());
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let gate = PauseGate::new();
        assert!(gate.toggle());
        assert!(gate.is_paused());
        assert!(!gate.toggle());
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_set_paused_is_idempotent() {
        let gate = PauseGate::new();
        gate.set_paused(true);
        gate.set_paused(true);
        assert!(gate.is_paused());
        gate.set_paused(false);
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let gate = PauseGate::new();
        let handle = gate.clone();
        handle.set_paused(true);
        assert!(gate.is_paused());
    }
}
