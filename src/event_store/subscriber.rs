//! Event subscribers
//!
//! Handlers invoked synchronously after every successful append.

use super::{EventEnvelope, EventStore};

/// A subscriber to newly appended events.
///
/// The handler gets the store that published the event so it can issue
/// follow-up commands without holding a reference back to it.
/// Returning an error (or panicking) never undoes the append that
/// triggered the call.
pub trait EventHandler: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handle(&self, store: &EventStore, event: &EventEnvelope) -> anyhow::Result<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&EventStore, &EventEnvelope) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn handle(&self, store: &EventStore, event: &EventEnvelope) -> anyhow::Result<()> {
        self(store, event)
    }
}
