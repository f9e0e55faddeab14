use axum::{extract::State, http::StatusCode, Json};
use tracing::debug;
use vispr_common::naming::{external_name, internal_name};

use crate::error::{describe_failure, ApiError};

use super::{
    method_not_found, ok, project_not_found, AnalysisPath, AnalysisResult, AnalysisSelection,
    ApiState,
};

pub(super) async fn get_analysis(
    State(state): State<ApiState>,
    AnalysisPath { project_id, method }: AnalysisPath,
    selection: AnalysisSelection,
) -> Result<(StatusCode, Json<AnalysisResult>), ApiError> {
    let project =
        state.workspace().project_at(project_id).ok_or_else(|| project_not_found(project_id))?;

    let method = internal_name(&method);
    if !project.has_analysis_method(&method) {
        return Err(method_not_found(&external_name(&method)));
    }

    let category =
        selection.category.ok_or_else(|| ApiError::bad_request("No category was specified."))?;
    let clustering =
        selection.clustering.ok_or_else(|| ApiError::bad_request("No clustering was specified."))?;
    let embedding =
        selection.embedding.ok_or_else(|| ApiError::bad_request("No embedding was specified."))?;

    let analysis = match project.analysis(&method, &category, &clustering, &embedding) {
        Ok(analysis) => analysis,
        Err(error) => {
            debug!(
                project = project.name(),
                method = %method,
                category = %category,
                clustering = %clustering,
                embedding = %embedding,
                error = %error,
                "analysis lookup missed"
            );
            return Err(ApiError::not_found(describe_failure(&error, state.debug())));
        }
    };

    Ok(ok(AnalysisResult {
        category_name: analysis.category_name.clone(),
        clustering_name: analysis.clustering_name.clone(),
        clustering: analysis.clustering.to_nested(),
        embedding_name: analysis.embedding_name.clone(),
        embedding: analysis.embedding.to_nested(),
        indices: analysis.indices.to_nested(),
    }))
}
