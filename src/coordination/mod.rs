//! Coordination between the version comparison and mod analysis sides.

mod barrier;

pub use barrier::{BarrierPolicy, BarrierStatus, CompletionBarrier, ReadyPair, ReadySignal};
