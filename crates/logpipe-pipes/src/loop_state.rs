use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{PipesError, Result};

/// Lifecycle of a part's loop. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopStateKind {
    Init = 0,
    Running = 1,
    Stopped = 2,
}

impl LoopStateKind {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopStateKind::Init,
            1 => LoopStateKind::Running,
            _ => LoopStateKind::Stopped,
        }
    }
}

/// Lock-free Init → Running → Stopped flag shared by a part and its workers.
#[derive(Debug)]
pub struct LoopState(AtomicU8);

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopState {
    pub fn new() -> Self {
        Self(AtomicU8::new(LoopStateKind::Init as u8))
    }

    pub fn get(&self) -> LoopStateKind {
        LoopStateKind::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from Init to Running, or fail with `InvalidLoopState` from any
    /// other state. Of two racing callers exactly one succeeds.
    pub fn try_start(&self) -> Result<()> {
        self.0
            .compare_exchange(
                LoopStateKind::Init as u8,
                LoopStateKind::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| PipesError::InvalidLoopState)
    }

    pub fn set_running(&self) {
        self.0.store(LoopStateKind::Running as u8, Ordering::Release);
    }

    pub fn set_stopped(&self) {
        self.0.store(LoopStateKind::Stopped as u8, Ordering::Release);
    }

    pub fn is_init(&self) -> bool {
        self.get() == LoopStateKind::Init
    }

    pub fn is_running(&self) -> bool {
        self.get() == LoopStateKind::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.get() == LoopStateKind::Stopped
    }
}
