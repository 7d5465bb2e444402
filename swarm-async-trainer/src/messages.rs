//! Messages sent by execution units to the supervisor.
use crossbeam_channel::Sender;
use std::fmt;

/// An execution unit supervised by [`train_async`](crate::train_async).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// The actor with the given id.
    Actor(usize),

    /// The learner.
    Learner,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "actor-{}", id),
            Self::Learner => write!(f, "learner"),
        }
    }
}

/// Messages that the supervisor receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMessage {
    /// The unit left its loop, normally, with an error or by panicking.
    Exited(Unit),
}

/// Sends [`UnitMessage::Exited`] when dropped, so that the supervisor hears
/// about every exit path of a unit's thread, including panics.
pub(crate) struct ExitNotifier {
    unit: Unit,
    sender: Sender<UnitMessage>,
}

impl ExitNotifier {
    pub(crate) fn new(unit: Unit, sender: Sender<UnitMessage>) -> Self {
        Self { unit, sender }
    }
}

impl Drop for ExitNotifier {
    fn drop(&mut self) {
        // The supervisor may already be gone when unwinding after its own failure.
        let _ = self.sender.send(UnitMessage::Exited(self.unit));
    }
}
