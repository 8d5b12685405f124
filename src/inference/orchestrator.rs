use crate::canvas::surface::Snapshot;
use crate::inference::client::{PredictError, PredictResponse, PredictTransport};
use crate::inference::encode::snapshot_to_base64_png;
use crate::inference::state::{PredictionState, StateEvent, DIGIT_CLASSES};
use chrono::Local;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct Outcome {
    seq: u64,
    result: Result<PredictResponse, PredictError>,
}

/// Issues prediction requests and applies their outcomes to the state store.
///
/// Requests are never cancelled. Ordering is enforced when outcomes are
/// applied instead: a response updates the prediction only if its sequence
/// number is newer than the last one applied, so the displayed result always
/// corresponds to the most recently issued request even when an older
/// response resolves later.
pub struct Orchestrator {
    transport: Arc<dyn PredictTransport>,
    outcome_tx: Sender<Outcome>,
    outcome_rx: Receiver<Outcome>,
    next_seq: u64,
    last_applied_seq: u64,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn PredictTransport>) -> Self {
        let (outcome_tx, outcome_rx) = channel();
        Self {
            transport,
            outcome_tx,
            outcome_rx,
            next_seq: 0,
            last_applied_seq: 0,
        }
    }

    /// Encode the snapshot and issue one request on a worker thread.
    /// In-flight predecessors keep running; their responses are discarded at
    /// application time if a newer one has already landed.
    pub fn submit(&mut self, snapshot: Snapshot, state: &mut PredictionState) {
        self.next_seq += 1;
        let seq = self.next_seq;
        state.apply(StateEvent::RequestIssued);
        tracing::debug!(seq, side = snapshot.side, "issuing prediction request");

        let encoded = match snapshot_to_base64_png(&snapshot) {
            Ok(encoded) => encoded,
            Err(err) => {
                // Surface failures during submission are reported, not
                // swallowed; route through the outcome channel so the flags
                // settle the same way as any other failure.
                tracing::warn!(seq, "snapshot encode failed: {err}");
                let _ = self.outcome_tx.send(Outcome {
                    seq,
                    result: Err(err),
                });
                return;
            }
        };

        let transport = Arc::clone(&self.transport);
        let tx = self.outcome_tx.clone();
        thread::spawn(move || {
            let result = transport.predict(&encoded);
            // The receiver is gone once the orchestrator is dropped; late
            // resolutions are then simply discarded.
            let _ = tx.send(Outcome { seq, result });
        });
    }

    /// Drain completed outcomes and fold them into the state store. Returns
    /// true when any outcome arrived.
    pub fn poll(&mut self, state: &mut PredictionState) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            changed = true;
            if outcome.seq <= self.last_applied_seq {
                tracing::debug!(seq = outcome.seq, "discarding stale prediction response");
                state.apply(StateEvent::StaleDiscarded);
                continue;
            }
            self.last_applied_seq = outcome.seq;
            match outcome.result {
                Ok(resp) => {
                    let mut probabilities = [0.0f32; DIGIT_CLASSES];
                    for (slot, p) in probabilities.iter_mut().zip(resp.probabilities.iter()) {
                        *slot = *p;
                    }
                    tracing::debug!(seq = outcome.seq, digit = resp.digit, "prediction applied");
                    state.apply(StateEvent::Resolved {
                        digit: resp.digit,
                        probabilities,
                        confidence: resp.confidence,
                        timestamp: Local::now(),
                    });
                }
                Err(err) => {
                    tracing::warn!(seq = outcome.seq, "prediction request failed: {err}");
                    state.apply(StateEvent::Failed {
                        message: err.user_message(),
                    });
                }
            }
        }
        changed
    }
}
