//! Deferred edge-interrupt latch.
//!
//! GPIO ISRs must return immediately — no pin reads, no formatting, no
//! allocation, no I/O. The only thing an edge ISR does here is flip one
//! shared flag; the main loop later consumes the flag and re-derives
//! *what* changed by re-reading every configured input's current level.
//!
//! ```text
//! ┌──────────────┐  set()            take()  ┌──────────────┐
//! │ GPIO ISR ×N  │────────▶ EdgeLatch ◀──────│  Main Loop   │
//! │ (any pin)    │        (AtomicBool)       │ (re-read all)│
//! └──────────────┘                           └──────────────┘
//! ```
//!
//! Known limitation, accepted by design: two rapid edges on the same pin
//! with no observable steady level in between coalesce into "nothing
//! happened" — only net level transitions per loop tick are visible.

use core::sync::atomic::{AtomicBool, Ordering};

/// A one-bit "something happened" latch shared between interrupt and
/// main contexts.
pub struct EdgeLatch(AtomicBool);

impl EdgeLatch {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Record a pending edge. The only operation permitted from ISR
    /// context (lock-free atomic store).
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the latch: returns the pending state and clears it in one
    /// indivisible step, so a flag set concurrently by an ISR during
    /// processing is never lost — it just triggers one extra re-check.
    ///
    /// Must only be called from the main loop, once per tick.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming (diagnostics and tests).
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide latch every input-pin ISR targets.
pub static EDGE_EVENTS: EdgeLatch = EdgeLatch::new();

/// ISR handler body — register this (via the C trampoline in `hw_init`)
/// on every configured input pin, rising and falling edge.
#[allow(unused)]
pub fn edge_isr_handler() {
    EDGE_EVENTS.set();
}
