//! Per-wake cycle phase machine.
//!
//! ```text
//!            no tick
//!   Idle ───────────────────────────────────────────▶ Sleeping
//!    │ tick                                               ▲ │
//!    ▼                                                    │ │ wake
//!  Sampling ──▶ Logging ──┬──────────────────────────────┘ │
//!                         │ uplink        ▲                 │
//!                         └──▶ Uploading ─┘                 │
//!   Idle ◀──────────────────────────────────────────────────┘
//! ```
//!
//! The tracker only records where the cycle is and rejects illegal jumps;
//! the orchestrator does the work of each phase.

use log::info;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CyclePhase {
    Idle = 0,
    Sampling = 1,
    Logging = 2,
    Uploading = 3,
    Sleeping = 4,
}

impl CyclePhase {
    pub const COUNT: usize = 5;

    const NAMES: [&'static str; Self::COUNT] = ["Idle", "Sampling", "Logging", "Uploading", "Sleeping"];

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Whether `self → next` is a legal step.
    pub fn can_go_to(self, next: Self) -> bool {
        use CyclePhase::{Idle, Logging, Sampling, Sleeping, Uploading};
        matches!(
            (self, next),
            (Idle, Sampling | Sleeping)
                | (Sampling, Logging)
                | (Logging, Uploading | Sleeping)
                | (Uploading, Sleeping)
                | (Sleeping, Idle)
        )
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct PhaseTracker {
    current: CyclePhase,
    /// Number of times `Sampling` was entered (ticks handled since boot).
    cycles: u64,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self { current: CyclePhase::Idle, cycles: 0 }
    }

    pub fn current(&self) -> CyclePhase {
        self.current
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Move to `next`.  Returns the phase left.  An illegal step is a
    /// programming error.
    pub fn transition(&mut self, next: CyclePhase) -> CyclePhase {
        let from = self.current;
        debug_assert!(from.can_go_to(next), "illegal phase step {from:?} -> {next:?}");
        info!("Cycle transition: {} -> {}", from.name(), next.name());
        if next == CyclePhase::Sampling {
            self.cycles += 1;
        }
        self.current = next;
        from
    }
}
