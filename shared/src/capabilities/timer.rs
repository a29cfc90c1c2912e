//! One-shot timers provided by the shell.
//!
//! Repeating behavior (carousel auto-play) is built by chaining one-shot
//! schedules, each tagged with a fresh [`TimerId`]. A tick whose id is not the
//! owner's current one is stale and ignored, so an owner can never have two
//! live timers even if the shell delivers a cancelled tick late.

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

use crate::carousel::CarouselId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerOwner {
    Carousel(CarouselId),
    Toast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId {
    pub owner: TimerOwner,
    pub seq: u64,
}

impl TimerId {
    #[must_use]
    pub const fn new(owner: TimerOwner, seq: u64) -> Self {
        Self { owner, seq }
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.owner {
            TimerOwner::Carousel(id) => write!(f, "{}#{}", id.as_str(), self.seq),
            TimerOwner::Toast => write!(f, "toast#{}", self.seq),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOperation {
    Schedule { id: TimerId, after_ms: u64 },
    Cancel { id: TimerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOutput {
    Fired,
    /// The shell resolves a cancelled schedule with this instead of `Fired`.
    Cancelled,
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

/// Pure description of timer work, returned by state machines and executed by
/// the app against the [`Timer`] capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Schedule { id: TimerId, after_ms: u64 },
    Cancel { id: TimerId },
}

#[derive(Capability)]
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Asks the shell to fire once after `after_ms`, then dispatches
    /// `make_event` with the outcome.
    pub fn schedule<F>(&self, id: TimerId, after_ms: u64, make_event: F)
    where
        F: FnOnce(TimerOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(TimerOperation::Schedule { id, after_ms })
                .await;
            ctx.update_app(make_event(output));
        });
    }

    pub fn cancel(&self, id: TimerId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_id_display() {
        let id = TimerId::new(TimerOwner::Carousel(CarouselId::Related), 4);
        assert_eq!(id.to_string(), "related#4");
        assert_eq!(TimerId::new(TimerOwner::Toast, 1).to_string(), "toast#1");
    }

    #[test]
    fn test_operation_serializes_with_owner() {
        let op = TimerOperation::Schedule {
            id: TimerId::new(TimerOwner::Carousel(CarouselId::Hero), 2),
            after_ms: 5000,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["Schedule"]["id"]["owner"]["carousel"], "hero");
        assert_eq!(json["Schedule"]["after_ms"], 5000);
    }
}
