pub mod scheduler;

pub use scheduler::{PassGuard, PassLatch, PollScheduler, TickOutcome};
