/// Timing mode governing when LL may attempt and when PF may swap (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// Continuous generation and swapping; no phase gating.
    #[default]
    Async,
    /// Periodic `t_slot`: EXTERNAL_START clears memories and restarts
    /// attempts on all active channels; LL's retry-on-release queue is
    /// flushed there.
    Lsync,
    /// Alternating EXTERNAL (`t_ext`, LL only) / INTERNAL (`t_int`, PF
    /// only) phases.
    Sync,
}

/// Phase-signal schedule for LSYNC/SYNC nodes (§4.4). LL and PF both react
/// to the same periodic signal rather than owning their own timers.
#[derive(Debug, Clone)]
pub struct SyncDriver {
    pub mode: TimingMode,
    pub t_slot: f64,
    pub t_ext: f64,
    pub t_int: f64,
}

impl SyncDriver {
    pub fn async_driver() -> Self {
        SyncDriver {
            mode: TimingMode::Async,
            t_slot: 0.0,
            t_ext: 0.0,
            t_int: 0.0,
        }
    }

    pub fn lsync(t_slot: f64) -> Self {
        SyncDriver {
            mode: TimingMode::Lsync,
            t_slot,
            t_ext: 0.0,
            t_int: 0.0,
        }
    }

    pub fn sync(t_ext: f64, t_int: f64) -> Self {
        SyncDriver {
            mode: TimingMode::Sync,
            t_slot: 0.0,
            t_ext,
            t_int,
        }
    }

    /// Delay until the first EXTERNAL_START signal, and the period of the
    /// full phase cycle thereafter. `None` under ASYNC (no phases at all).
    pub fn cycle(&self) -> Option<(f64, f64)> {
        match self.mode {
            TimingMode::Async => None,
            TimingMode::Lsync => Some((self.t_slot, self.t_slot)),
            TimingMode::Sync => Some((self.t_ext, self.t_ext + self.t_int)),
        }
    }
}
