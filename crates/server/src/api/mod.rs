mod analyses;
mod extract;
mod workspace;

use std::{fmt::Display, sync::Arc};

use axum::{http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vispr_common::Workspace;

use crate::error::ApiError;

pub use extract::{AnalysisPath, AnalysisSelection};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    workspace: Arc<Workspace>,
    debug: bool,
}

impl ApiState {
    pub fn new(workspace: Arc<Workspace>, debug: bool) -> Self {
        Self { workspace, debug }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// Position of the project in the workspace's enumeration order.
    pub id: usize,
    pub name: String,
    pub model: Value,
    pub dataset_name: String,
    pub analysis_methods: Vec<AnalysisMethodSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMethodSummary {
    /// Hyphenated method name, as used in analysis URLs.
    pub name: String,
    pub categories: Vec<String>,
    pub clusterings: Vec<String>,
    pub embeddings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub category_name: String,
    pub clustering_name: String,
    pub clustering: Value,
    pub embedding_name: String,
    pub embedding: Value,
    pub indices: Value,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/workspace", get(workspace::get_workspace))
        .route(
            "/api/projects/{project_id}/analyses/{analysis_method_name}",
            get(analyses::get_analysis),
        )
        .with_state(state)
}

fn ok<T: Serialize>(payload: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(payload))
}

fn project_not_found(project_id: impl Display) -> ApiError {
    ApiError::not_found(format!("The project with the ID {project_id} could not be found."))
}

fn method_not_found(external_name: &str) -> ApiError {
    ApiError::not_found(format!(
        "The specified analysis method \"{external_name}\" could not be found."
    ))
}
