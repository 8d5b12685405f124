use digit_pad::inference::client::{validate_prediction, PredictError, PredictResponse};

fn response(digit: u8, probabilities: Vec<f32>) -> PredictResponse {
    PredictResponse {
        digit,
        confidence: 0.9,
        probabilities,
        label: digit.to_string(),
        id: Some(1),
    }
}

#[test]
fn valid_prediction_passes_the_contract_check() {
    let mut probabilities = vec![0.0f32; 10];
    probabilities[2] = 0.9;
    assert!(validate_prediction(&response(2, probabilities)).is_ok());
}

#[test]
fn short_probability_vector_is_a_contract_violation() {
    let err = validate_prediction(&response(2, vec![0.1; 9])).unwrap_err();
    assert!(matches!(err, PredictError::MalformedResponse(_)));
    assert_eq!(err.user_message(), "Prediction failed");
}

#[test]
fn out_of_range_digit_is_a_contract_violation() {
    let err = validate_prediction(&response(12, vec![0.1; 10])).unwrap_err();
    assert!(matches!(err, PredictError::MalformedResponse(_)));
}

#[test]
fn negative_or_non_finite_probabilities_are_rejected() {
    let mut probabilities = vec![0.1f32; 10];
    probabilities[4] = -0.2;
    assert!(matches!(
        validate_prediction(&response(4, probabilities)),
        Err(PredictError::MalformedResponse(_))
    ));

    let mut probabilities = vec![0.1f32; 10];
    probabilities[4] = f32::NAN;
    assert!(matches!(
        validate_prediction(&response(4, probabilities)),
        Err(PredictError::MalformedResponse(_))
    ));
}

#[test]
fn user_message_prefers_the_service_detail() {
    let err = PredictError::Service {
        status: 503,
        detail: Some("model not loaded".to_string()),
    };
    assert_eq!(err.user_message(), "model not loaded");

    let err = PredictError::Service {
        status: 500,
        detail: None,
    };
    assert_eq!(err.user_message(), "Prediction failed");
}

#[test]
fn surface_unavailable_is_reported_distinctly() {
    let err = PredictError::SurfaceUnavailable;
    assert_eq!(err.user_message(), "Drawing surface unavailable");
    assert_eq!(err.to_string(), "drawing surface unavailable");
}
