use digit_pad::canvas::surface::CanvasSurface;
use digit_pad::inference::client::{PredictError, PredictResponse, PredictTransport};
use digit_pad::inference::orchestrator::Orchestrator;
use digit_pad::inference::state::PredictionState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn response(digit: u8, confidence: f32) -> PredictResponse {
    let mut probabilities = vec![0.0f32; 10];
    probabilities[digit as usize] = confidence;
    PredictResponse {
        digit,
        confidence,
        probabilities,
        label: digit.to_string(),
        id: None,
    }
}

/// Transport whose calls consume a script of (delay, result) entries in
/// issuance order, so resolution order can be made to differ from it.
struct ScriptedTransport {
    script: Mutex<VecDeque<(u64, Result<PredictResponse, PredictError>)>>,
}

impl ScriptedTransport {
    fn new(entries: Vec<(u64, Result<PredictResponse, PredictError>)>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(entries.into()),
        })
    }

    fn push(&self, delay_ms: u64, result: Result<PredictResponse, PredictError>) {
        self.script.lock().unwrap().push_back((delay_ms, result));
    }
}

impl PredictTransport for ScriptedTransport {
    fn predict(&self, _image_base64: &str) -> Result<PredictResponse, PredictError> {
        let (delay_ms, result) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted");
        std::thread::sleep(Duration::from_millis(delay_ms));
        result
    }
}

/// Block until all but `remaining` script entries have been claimed, so the
/// next submit deterministically receives the next entry.
fn wait_for_claims(transport: &ScriptedTransport, remaining: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while transport.script.lock().unwrap().len() > remaining {
        assert!(Instant::now() < deadline, "script entries never claimed");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn wait_until_settled(orchestrator: &mut Orchestrator, state: &mut PredictionState) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        orchestrator.poll(state);
        if !state.loading {
            return;
        }
        assert!(Instant::now() < deadline, "requests never settled");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn snapshot() -> digit_pad::canvas::surface::Snapshot {
    CanvasSurface::new(Some(30.0)).export_snapshot()
}

#[test]
fn last_issued_wins_under_network_jitter() {
    // Request A resolves slowly, request B (issued later) quickly; the final
    // state must reflect B even though A resolves last.
    let transport = ScriptedTransport::new(vec![
        (200, Ok(response(3, 0.8))),
        (10, Ok(response(7, 0.9))),
    ]);
    let mut orchestrator = Orchestrator::new(Arc::clone(&transport) as Arc<dyn PredictTransport>);
    let mut state = PredictionState::new(50);

    orchestrator.submit(snapshot(), &mut state);
    wait_for_claims(&transport, 1);
    orchestrator.submit(snapshot(), &mut state);
    assert!(state.loading);

    wait_until_settled(&mut orchestrator, &mut state);

    assert_eq!(state.digit, Some(7));
    assert!((state.probabilities[7] - 0.9).abs() < 1e-6);
    assert!(state.error.is_none());
    // The stale response was discarded, so only one history entry exists.
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.history()[0].digit, 7);
}

#[test]
fn stale_failure_cannot_clobber_a_newer_success() {
    let transport = ScriptedTransport::new(vec![
        (
            200,
            Err(PredictError::Service {
                status: 500,
                detail: Some("model crashed".to_string()),
            }),
        ),
        (10, Ok(response(4, 0.7))),
    ]);
    let mut orchestrator = Orchestrator::new(Arc::clone(&transport) as Arc<dyn PredictTransport>);
    let mut state = PredictionState::new(50);

    orchestrator.submit(snapshot(), &mut state);
    wait_for_claims(&transport, 1);
    orchestrator.submit(snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);

    assert_eq!(state.digit, Some(4));
    assert!(state.error.is_none(), "stale failure must be discarded");
}

#[test]
fn failure_leaves_prior_prediction_and_prefers_service_detail() {
    let transport = ScriptedTransport::new(vec![(0, Ok(response(5, 0.95)))]);
    let mut orchestrator = Orchestrator::new(Arc::clone(&transport) as Arc<dyn PredictTransport>);
    let mut state = PredictionState::new(50);

    orchestrator.submit(snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);
    assert_eq!(state.digit, Some(5));

    transport.push(
        0,
        Err(PredictError::Service {
            status: 503,
            detail: Some("model not loaded".to_string()),
        }),
    );
    orchestrator.submit(snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);

    assert_eq!(state.digit, Some(5), "failures are non-destructive");
    assert_eq!(state.error.as_deref(), Some("model not loaded"));
}

#[test]
fn failure_without_detail_uses_the_generic_message() {
    let transport = ScriptedTransport::new(vec![(
        0,
        Err(PredictError::Service {
            status: 500,
            detail: None,
        }),
    )]);
    let mut orchestrator = Orchestrator::new(transport);
    let mut state = PredictionState::new(50);

    orchestrator.submit(snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);
    assert_eq!(state.error.as_deref(), Some("Prediction failed"));
}

#[test]
fn blank_snapshot_produces_a_renderable_result() {
    // A background-only canvas still round-trips: the service may answer with
    // low confidence, but nothing throws.
    let transport = ScriptedTransport::new(vec![(0, Ok(response(0, 0.11)))]);
    let mut orchestrator = Orchestrator::new(transport);
    let mut state = PredictionState::new(50);

    orchestrator.submit(CanvasSurface::new(None).export_snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);

    assert_eq!(state.digit, Some(0));
    assert!(state.error.is_none());
    assert_eq!(state.history().len(), 1);
}

#[test]
fn malformed_response_is_surfaced_as_a_failure() {
    let transport = ScriptedTransport::new(vec![(
        0,
        Err(PredictError::MalformedResponse(
            "expected 10 probabilities, got 9".to_string(),
        )),
    )]);
    let mut orchestrator = Orchestrator::new(transport);
    let mut state = PredictionState::new(50);

    orchestrator.submit(snapshot(), &mut state);
    wait_until_settled(&mut orchestrator, &mut state);

    assert_eq!(state.digit, None);
    assert_eq!(state.error.as_deref(), Some("Prediction failed"));
    assert!(state.history().is_empty());
}
