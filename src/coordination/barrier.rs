//! Two-phase completion barrier.
//!
//! Analysis of a mod against a version upgrade needs two inputs: the mod's
//! analysis report ("source ready") and the version change report ("target
//! ready"). They arrive independently and in any order. The barrier pairs
//! them and emits one [`ReadyPair`] on its channel each time both sides are
//! present, then resets.
//!
//! All transitions happen under a single mutex and the event is sent before
//! the lock is released, so the consumer sees events in fire order.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One side of the barrier becoming ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySignal {
    /// Version the report describes (mod version or game version)
    pub version: String,
    /// Location of the produced report
    pub report_path: PathBuf,
}

impl ReadySignal {
    #[must_use]
    pub fn new(version: impl Into<String>, report_path: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            report_path: report_path.into(),
        }
    }
}

/// Event emitted when both sides are ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyPair {
    pub source: ReadySignal,
    pub target: ReadySignal,
}

/// What happens when a side is marked again before the barrier fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BarrierPolicy {
    /// The newer signal replaces the pending one
    #[default]
    LatestWins,
    /// Signals queue per side; every completed pair fires once, oldest first
    Queue,
}

/// Observable barrier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierStatus {
    /// Neither side is pending
    Waiting,
    /// Source is ready, waiting for target
    SourcePending,
    /// Target is ready, waiting for source
    TargetPending,
}

impl std::fmt::Display for BarrierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::SourcePending => write!(f, "source ready, waiting for target"),
            Self::TargetPending => write!(f, "target ready, waiting for source"),
        }
    }
}

#[derive(Debug)]
struct Slots {
    source: VecDeque<ReadySignal>,
    target: VecDeque<ReadySignal>,
    fired: u64,
    sender: Sender<ReadyPair>,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Source,
    Target,
}

/// Pairs source and target readiness into single events.
#[derive(Debug)]
pub struct CompletionBarrier {
    policy: BarrierPolicy,
    slots: Mutex<Slots>,
}

impl CompletionBarrier {
    /// Create a barrier and the receiver its events are delivered to.
    #[must_use]
    pub fn new(policy: BarrierPolicy) -> (Self, Receiver<ReadyPair>) {
        let (sender, receiver) = mpsc::channel();
        let barrier = Self {
            policy,
            slots: Mutex::new(Slots {
                source: VecDeque::new(),
                target: VecDeque::new(),
                fired: 0,
                sender,
            }),
        };
        (barrier, receiver)
    }

    pub const fn policy(&self) -> BarrierPolicy {
        self.policy
    }

    /// Mark the mod analysis side ready. Returns true if this call fired.
    pub fn mark_source_ready(&self, signal: ReadySignal) -> bool {
        self.mark(Side::Source, signal)
    }

    /// Mark the version change side ready. Returns true if this call fired.
    pub fn mark_target_ready(&self, signal: ReadySignal) -> bool {
        self.mark(Side::Target, signal)
    }

    fn mark(&self, side: Side, signal: ReadySignal) -> bool {
        let mut slots = self.lock();
        tracing::debug!(?side, version = %signal.version, "barrier side ready");

        let queue = match side {
            Side::Source => &mut slots.source,
            Side::Target => &mut slots.target,
        };
        if self.policy == BarrierPolicy::LatestWins && !queue.is_empty() {
            tracing::debug!(?side, "replacing pending signal");
            queue.clear();
        }
        queue.push_back(signal);

        if slots.source.is_empty() || slots.target.is_empty() {
            return false;
        }
        let (Some(source), Some(target)) = (slots.source.pop_front(), slots.target.pop_front())
        else {
            return false;
        };
        slots.fired += 1;
        tracing::info!(
            source = %source.version,
            target = %target.version,
            fired = slots.fired,
            "barrier fired"
        );
        if slots.sender.send(ReadyPair { source, target }).is_err() {
            tracing::warn!("barrier consumer disconnected, event dropped");
        }
        true
    }

    /// Current barrier state.
    pub fn status(&self) -> BarrierStatus {
        let slots = self.lock();
        match (slots.source.is_empty(), slots.target.is_empty()) {
            (false, true) => BarrierStatus::SourcePending,
            (true, false) => BarrierStatus::TargetPending,
            _ => BarrierStatus::Waiting,
        }
    }

    /// Number of pending signals per side as `(source, target)`.
    pub fn pending(&self) -> (usize, usize) {
        let slots = self.lock();
        (slots.source.len(), slots.target.len())
    }

    /// Number of events emitted so far.
    pub fn fired_count(&self) -> u64 {
        self.lock().fired
    }

    // Slots are never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
