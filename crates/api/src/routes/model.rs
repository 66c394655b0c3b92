//! Model Metadata Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Loaded model description
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub kind: String,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub has_scaler_mean: bool,
}

/// Describe the loaded artifacts
pub async fn get_model(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    let store = state.pipeline.store();

    Json(ModelInfo {
        kind: store.model_kind().to_string(),
        feature_count: store.schema().len(),
        feature_names: store.feature_names().to_vec(),
        classes: store.classes().iter().map(|c| c.to_string()).collect(),
        has_scaler_mean: store.has_scaler_mean(),
    })
}
