// Request extractors for the analysis endpoint.
//
// Both answer rejections with the JSON error envelope instead of axum's
// plain-text bodies.

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};

use crate::error::ApiError;

use super::project_not_found;

/// `/api/projects/{project_id}/analyses/{analysis_method_name}` path segments.
///
/// A project ID that is not a plain decimal number never reaches the handler;
/// it is rejected like an unknown project.
#[derive(Debug, PartialEq, Eq)]
pub struct AnalysisPath {
    pub project_id: usize,
    /// Method name as it appeared in the URL (hyphenated form).
    pub method: String,
}

impl<S> FromRequestParts<S> for AnalysisPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((raw_project_id, method)) =
            Path::<(String, String)>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        let project_id =
            parse_project_id(&raw_project_id).ok_or_else(|| project_not_found(&raw_project_id))?;

        Ok(Self { project_id, method })
    }
}

fn parse_project_id(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// The `category`, `clustering` and `embedding` query parameters.
///
/// Presence is all that is checked here; when a parameter repeats, the first
/// occurrence wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnalysisSelection {
    pub category: Option<String>,
    pub clustering: Option<String>,
    pub embedding: Option<String>,
}

impl AnalysisSelection {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut selection = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category" => &mut selection.category,
                "clustering" => &mut selection.clustering,
                "embedding" => &mut selection.embedding,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        selection
    }
}

impl<S> FromRequestParts<S> for AnalysisSelection
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self::from_pairs(pairs))
    }
}
