//! Stream health counters and resynchronization policy
//!
//! The receiver keeps producing bytes whether or not we keep up; the OS
//! buffers them. These counters decide when the buffered backlog should be
//! discarded so the feed stays fresh: either as a periodic resync once the
//! stream has proven healthy, or immediately when one message kind runs far
//! ahead of the others.

/// Message kinds tracked by the health policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedKind {
    PositionFix,
    RelativePosition,
    SatelliteInfo,
}

impl TrackedKind {
    const COUNT: usize = 3;

    #[inline]
    fn index(self) -> usize {
        match self {
            TrackedKind::PositionFix => 0,
            TrackedKind::RelativePosition => 1,
            TrackedKind::SatelliteInfo => 2,
        }
    }
}

/// Why a channel flush was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// Every tracked kind dispatched at least twice; bounded-staleness resync
    PeriodicResync,
    /// One kind is running away; discard backlog rather than grow it
    Backlog,
    /// An unrecognized or corrupt frame came off the wire
    CorruptFrame,
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushReason::PeriodicResync => write!(f, "periodic resync"),
            FlushReason::Backlog => write!(f, "backlog"),
            FlushReason::CorruptFrame => write!(f, "corrupt frame"),
        }
    }
}

/// All counters must exceed this for the periodic resync rule
const LOW_WATER: u32 = 1;
/// Any counter exceeding this triggers the overflow rule
const HIGH_WATER: u32 = 10;

/// Per-kind dispatch counters, owned by the consumer thread
///
/// Mutation and policy evaluation both happen on the dispatch side, so no
/// locking is involved anywhere in this type.
#[derive(Debug, Default)]
pub struct StreamHealth {
    counters: [u32; TrackedKind::COUNT],
}

impl StreamHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful dispatch of `kind`
    pub fn record(&mut self, kind: TrackedKind) {
        self.counters[kind.index()] += 1;
    }

    /// Evaluate the flush rules against the current counters
    ///
    /// The periodic rule wins when both apply; the action is identical.
    pub fn decide(&self) -> Option<FlushReason> {
        if self.counters.iter().all(|&c| c > LOW_WATER) {
            Some(FlushReason::PeriodicResync)
        } else if self.counters.iter().any(|&c| c > HIGH_WATER) {
            Some(FlushReason::Backlog)
        } else {
            None
        }
    }

    /// Zero all counters
    pub fn reset(&mut self) {
        self.counters = [0; TrackedKind::COUNT];
    }

    /// Current counter snapshot (position, relative position, satellite)
    pub fn counters(&self) -> [u32; TrackedKind::COUNT] {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_water_rule() {
        let mut health = StreamHealth::new();
        let kinds = [
            TrackedKind::PositionFix,
            TrackedKind::RelativePosition,
            TrackedKind::SatelliteInfo,
        ];

        // One of each is not enough
        for kind in kinds {
            health.record(kind);
            assert_eq!(health.decide(), None);
        }

        // Second round: only complete once all three reach 2
        health.record(TrackedKind::PositionFix);
        health.record(TrackedKind::RelativePosition);
        assert_eq!(health.decide(), None);
        health.record(TrackedKind::SatelliteInfo);

        assert_eq!(health.counters(), [2, 2, 2]);
        assert_eq!(health.decide(), Some(FlushReason::PeriodicResync));

        health.reset();
        assert_eq!(health.counters(), [0, 0, 0]);
        assert_eq!(health.decide(), None);
    }

    #[test]
    fn test_high_water_rule() {
        let mut health = StreamHealth::new();
        for _ in 0..10 {
            health.record(TrackedKind::SatelliteInfo);
            assert_eq!(health.decide(), None);
        }
        health.record(TrackedKind::SatelliteInfo);
        assert_eq!(health.counters(), [0, 0, 11]);
        assert_eq!(health.decide(), Some(FlushReason::Backlog));
    }

    #[test]
    fn test_periodic_wins_over_backlog() {
        let mut health = StreamHealth::new();
        for _ in 0..12 {
            health.record(TrackedKind::PositionFix);
        }
        health.record(TrackedKind::RelativePosition);
        health.record(TrackedKind::RelativePosition);
        health.record(TrackedKind::SatelliteInfo);
        health.record(TrackedKind::SatelliteInfo);
        assert_eq!(health.decide(), Some(FlushReason::PeriodicResync));
    }
}
