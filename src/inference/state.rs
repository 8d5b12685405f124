use chrono::{DateTime, Local};
use std::collections::VecDeque;

pub const DIGIT_CLASSES: usize = 10;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One successfully resolved prediction, kept in the bounded history log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub digit: u8,
    pub confidence: f32,
    pub timestamp: DateTime<Local>,
}

/// Discrete events dispatched by the orchestrator; the state store is
/// mutated through these and nothing else.
#[derive(Debug, Clone)]
pub enum StateEvent {
    RequestIssued,
    Resolved {
        digit: u8,
        probabilities: [f32; DIGIT_CLASSES],
        confidence: f32,
        timestamp: DateTime<Local>,
    },
    Failed {
        message: String,
    },
    /// A response arrived for a request that was superseded by a newer one.
    /// It settles the loading flag but never touches the prediction.
    StaleDiscarded,
}

#[derive(Debug, Clone)]
pub struct PredictionState {
    pub digit: Option<u8>,
    pub probabilities: [f32; DIGIT_CLASSES],
    pub loading: bool,
    pub error: Option<String>,
    history: VecDeque<HistoryEntry>,
    history_limit: usize,
    in_flight: usize,
}

impl PredictionState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            digit: None,
            probabilities: [0.0; DIGIT_CLASSES],
            loading: false,
            error: None,
            history: VecDeque::new(),
            history_limit,
            in_flight: 0,
        }
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn apply(&mut self, event: StateEvent) {
        match event {
            StateEvent::RequestIssued => {
                self.in_flight += 1;
                self.loading = true;
                self.error = None;
            }
            StateEvent::Resolved {
                digit,
                probabilities,
                confidence,
                timestamp,
            } => {
                self.settle();
                self.digit = Some(digit);
                self.probabilities = probabilities;
                self.history.push_front(HistoryEntry {
                    digit,
                    confidence,
                    timestamp,
                });
                while self.history.len() > self.history_limit {
                    self.history.pop_back();
                }
            }
            StateEvent::Failed { message } => {
                // Non-destructive: digit and probabilities keep their last
                // applied values.
                self.settle();
                self.error = Some(message);
            }
            StateEvent::StaleDiscarded => self.settle(),
        }
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
    }
}

impl Default for PredictionState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDigit {
    pub digit: u8,
    pub probability: f32,
}

/// Digits sorted by descending probability; exact ties break on ascending
/// digit so the ordering is deterministic.
pub fn confidence_ranking(probabilities: &[f32; DIGIT_CLASSES]) -> Vec<RankedDigit> {
    let mut ranked: Vec<RankedDigit> = probabilities
        .iter()
        .enumerate()
        .map(|(digit, &probability)| RankedDigit {
            digit: digit as u8,
            probability,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.digit.cmp(&b.digit))
    });
    ranked
}

/// Displayed confidence: the best probability in the vector.
pub fn top_confidence(probabilities: &[f32; DIGIT_CLASSES]) -> f32 {
    probabilities.iter().copied().fold(0.0, f32::max)
}

pub fn format_confidence(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// History rows ready for display: digit, formatted confidence, local
/// wall-clock time. Newest first; insertion order is display order.
pub fn history_rows(history: &VecDeque<HistoryEntry>) -> Vec<(u8, String, String)> {
    history
        .iter()
        .map(|entry| {
            (
                entry.digit,
                format_confidence(entry.confidence),
                entry.timestamp.format("%H:%M:%S").to_string(),
            )
        })
        .collect()
}
