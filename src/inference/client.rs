use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

/// Failure modes of the inference path.
#[derive(Debug)]
pub enum PredictError {
    /// The request never reached the service.
    Network(reqwest::Error),
    /// The service answered with a non-success status, optionally carrying a
    /// structured `detail` field.
    Service { status: u16, detail: Option<String> },
    /// A success response that violates the expected shape.
    MalformedResponse(String),
    /// The drawing surface could not be read at submission time.
    SurfaceUnavailable,
}

impl PredictError {
    /// User-visible message: prefer the service-provided detail, fall back to
    /// a generic one.
    pub fn user_message(&self) -> String {
        match self {
            PredictError::Service {
                detail: Some(detail),
                ..
            } => detail.clone(),
            PredictError::SurfaceUnavailable => "Drawing surface unavailable".to_string(),
            _ => "Prediction failed".to_string(),
        }
    }
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::Network(err) => write!(f, "network failure: {err}"),
            PredictError::Service {
                status,
                detail: Some(detail),
            } => write!(f, "service error {status}: {detail}"),
            PredictError::Service { status, .. } => write!(f, "service error {status}"),
            PredictError::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
            PredictError::SurfaceUnavailable => write!(f, "drawing surface unavailable"),
        }
    }
}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PredictError::Network(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub digit: u8,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
    pub label: String,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    pub image_base64: String,
    pub label: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplesResponse {
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateResponse {
    pub accuracy: f64,
    pub confusion_matrix: Vec<Vec<u32>>,
    pub classification_report: serde_json::Value,
    #[serde(default)]
    pub precision: Option<String>,
    #[serde(default)]
    pub recall: Option<String>,
    #[serde(default)]
    pub f1_score: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainResponse {
    pub message: String,
    pub test_accuracy: f64,
    pub test_loss: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainProgress {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_epoch: Option<u32>,
    #[serde(default)]
    pub total_epochs: Option<u32>,
    #[serde(default)]
    pub loss: Option<f64>,
    #[serde(default)]
    pub acc: Option<f64>,
    #[serde(default)]
    pub val_loss: Option<f64>,
    #[serde(default)]
    pub val_acc: Option<f64>,
    #[serde(default)]
    pub test_accuracy: Option<f64>,
    #[serde(default)]
    pub test_loss: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRun {
    pub id: i64,
    pub model_type: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub test_accuracy: f64,
    pub test_loss: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRunsResponse {
    pub results: Vec<TrainingRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub digit: u8,
    pub confidence: f32,
    pub source: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsResponse {
    pub count: u32,
    pub results: Vec<PredictionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Validate the classifier contract on a predict response. Violations are
/// displayed like service errors but kept distinguishable.
pub fn validate_prediction(resp: &PredictResponse) -> Result<(), PredictError> {
    if resp.probabilities.len() != 10 {
        return Err(PredictError::MalformedResponse(format!(
            "expected 10 probabilities, got {}",
            resp.probabilities.len()
        )));
    }
    if resp.digit > 9 {
        return Err(PredictError::MalformedResponse(format!(
            "digit {} out of range",
            resp.digit
        )));
    }
    if resp
        .probabilities
        .iter()
        .any(|p| !p.is_finite() || *p < 0.0)
    {
        return Err(PredictError::MalformedResponse(
            "probabilities must be finite and non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Transport seam used by the orchestrator; the HTTP client below is the
/// production implementation, tests substitute their own.
pub trait PredictTransport: Send + Sync {
    fn predict(&self, image_base64: &str) -> Result<PredictResponse, PredictError>;
}

/// Blocking client for the classifier service. The only write is
/// `/predict/base64`; every GET is idempotent.
pub struct PredictClient {
    client: Client,
    base_url: String,
}

impl PredictClient {
    pub fn new(base_url: &str) -> Result<Self, PredictError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("digit-pad")
            .build()
            .map_err(PredictError::Network)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, PredictError> {
        let resp = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(PredictError::Network)?;
        parse_response(resp)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PredictError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(PredictError::Network)?;
        parse_response(resp)
    }

    pub fn predict_base64(&self, image_base64: &str) -> Result<PredictResponse, PredictError> {
        let parsed: PredictResponse =
            self.post_json("/predict/base64", serde_json::json!({ "image": image_base64 }))?;
        validate_prediction(&parsed)?;
        Ok(parsed)
    }

    pub fn samples(&self, count: u32, digit: Option<u8>) -> Result<SamplesResponse, PredictError> {
        let mut path = format!("/samples?count={count}");
        if let Some(digit) = digit {
            path.push_str(&format!("&digit={digit}"));
        }
        self.get_json(&path)
    }

    pub fn evaluate(&self) -> Result<EvaluateResponse, PredictError> {
        self.get_json("/evaluate")
    }

    pub fn train(
        &self,
        model_type: &str,
        epochs: u32,
        batch_size: u32,
    ) -> Result<TrainResponse, PredictError> {
        self.post_json(
            "/train",
            serde_json::json!({
                "model_type": model_type,
                "epochs": epochs,
                "batch_size": batch_size,
            }),
        )
    }

    pub fn train_progress(&self) -> Result<TrainProgress, PredictError> {
        self.get_json("/train/progress")
    }

    pub fn training_runs(&self) -> Result<TrainingRunsResponse, PredictError> {
        self.get_json("/training-runs")
    }

    pub fn predictions(&self) -> Result<PredictionsResponse, PredictError> {
        self.get_json("/predictions")
    }

    pub fn health(&self) -> Result<HealthResponse, PredictError> {
        self.get_json("/health")
    }

    pub fn model_status(&self) -> Result<ModelStatus, PredictError> {
        self.get_json("/model/status")
    }
}

impl PredictTransport for PredictClient {
    fn predict(&self, image_base64: &str) -> Result<PredictResponse, PredictError> {
        self.predict_base64(image_base64)
    }
}

fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::blocking::Response,
) -> Result<T, PredictError> {
    let status = resp.status();
    let text = resp.text().map_err(PredictError::Network)?;
    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.detail);
        return Err(PredictError::Service {
            status: status.as_u16(),
            detail,
        });
    }
    serde_json::from_str(&text).map_err(|err| PredictError::MalformedResponse(err.to_string()))
}
