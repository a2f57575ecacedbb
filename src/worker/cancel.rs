//! Shared stop signal and first-match arbitration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way stop signal shared by the coordinator, monitors and workers.
///
/// Once cancelled it stays cancelled. Cancelling again is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the token. Returns true only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Single slot deciding which match wins a run.
#[derive(Debug, Default)]
pub struct MatchSlot {
    claimed: AtomicBool,
}

impl MatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot. Only the first caller gets true.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        assert!(token.cancel());
        assert!(!clone.cancel());
        assert!(clone.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_concurrent_cancel_flips_once() {
        let token = CancellationToken::new();
        let flips: usize = (0..8)
            .map(|_| {
                let token = token.clone();
                thread::spawn(move || token.cancel())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(flips, 1);
    }

    #[test]
    fn test_slot_claimed_once() {
        let slot = Arc::new(MatchSlot::new());
        let wins: usize = (0..8)
            .map(|_| {
                let slot = slot.clone();
                thread::spawn(move || slot.try_claim())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
        assert!(slot.is_claimed());
    }
}
