use futures::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;

use super::SessionEvent;
use super::state::{Slot, SlotUpdate};
use crate::error::LlmError;

/// Forwards one sequence of snapshots to the state owner as slot updates.
#[derive(Debug, Clone)]
pub struct Aggregator {
    slot: Slot,
    events: UnboundedSender<SessionEvent>,
}

impl Aggregator {
    pub fn new(slot: Slot, events: UnboundedSender<SessionEvent>) -> Self {
        Self { slot, events }
    }

    /// Consume `updates` until it ends or fails, returning how many were forwarded.
    ///
    /// `observe` sees each update before it is sent. A failure is logged and
    /// reported; updates already forwarded stay in effect.
    pub async fn run<S, F>(self, updates: S, mut observe: F) -> usize
    where
        S: Stream<Item = Result<SlotUpdate, LlmError>>,
        F: FnMut(&SlotUpdate),
    {
        let mut updates = std::pin::pin!(updates);
        let mut forwarded = 0usize;

        while let Some(item) = updates.next().await {
            match item {
                Ok(update) => {
                    debug_assert_eq!(update.slot(), self.slot);
                    observe(&update);
                    if self.events.send(SessionEvent::Update(update)).is_err() {
                        tracing::debug!(slot = %self.slot, "session closed, dropping stream");
                        return forwarded;
                    }
                    forwarded += 1;
                    tracing::debug!(slot = %self.slot, forwarded, "slot updated");
                }
                Err(error) => {
                    tracing::warn!(
                        slot = %self.slot,
                        forwarded,
                        category = ?error.category(),
                        "stream failed: {}",
                        error
                    );
                    // The receiver may already be gone on shutdown.
                    let _ = self.events.send(SessionEvent::StreamFailed {
                        slot: self.slot,
                        error,
                    });
                    return forwarded;
                }
            }
        }

        let _ = self.events.send(SessionEvent::StreamCompleted {
            slot: self.slot,
            updates: forwarded,
        });
        forwarded
    }
}
