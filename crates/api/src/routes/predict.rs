//! Prediction Routes

use axum::{body::Bytes, extract::State, Json};
use inference_engine::PredictionResult;
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::AppState;

/// Parse a request body. An empty body is an empty object.
pub(crate) fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Malformed JSON: {}", e)))
}

/// Predict the outcome of one startup
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let start = Instant::now();
    counter!("predict_requests_total").increment(1);

    let result = parse_body(&body).and_then(|input| Ok(state.pipeline.predict_json(&input)?));
    histogram!("predict_latency_seconds").record(start.elapsed().as_secs_f64());

    match result {
        Ok(prediction) => {
            counter!("predictions_total", "outcome" => prediction.prediction.as_str())
                .increment(1);
            Ok(Json(prediction))
        }
        Err(err) => {
            let kind = match &err {
                ApiError::BadRequest(_) => "malformed_json",
                ApiError::Inference(e) => e.kind(),
            };
            counter!("predict_errors_total", "kind" => kind).increment(1);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(parse_body(b"").unwrap(), serde_json::json!({}));
        assert_eq!(parse_body(b" \n").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = parse_body(b"{\"funding_total\": ").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
