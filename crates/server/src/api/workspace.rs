use axum::{extract::State, http::StatusCode, Json};
use vispr_common::{naming::external_name, AnalysisMethod, Project};

use super::{ok, AnalysisMethodSummary, ApiState, ProjectSummary};

pub(super) async fn get_workspace(
    State(state): State<ApiState>,
) -> (StatusCode, Json<Vec<ProjectSummary>>) {
    let workspace = state.workspace();
    let projects: Vec<ProjectSummary> = workspace
        .project_names()
        .into_iter()
        .enumerate()
        .filter_map(|(id, name)| workspace.project(name).map(|project| summarize(id, project)))
        .collect();

    ok(projects)
}

fn summarize(id: usize, project: &Project) -> ProjectSummary {
    ProjectSummary {
        id,
        name: project.name().to_owned(),
        model: project.model().clone(),
        dataset_name: project.dataset().name.clone(),
        analysis_methods: project.analysis_methods().iter().map(summarize_method).collect(),
    }
}

fn summarize_method(method: &AnalysisMethod) -> AnalysisMethodSummary {
    AnalysisMethodSummary {
        name: external_name(method.name()),
        categories: method.category_names().to_vec(),
        clusterings: method.clustering_names().to_vec(),
        embeddings: method.embedding_names().to_vec(),
    }
}
