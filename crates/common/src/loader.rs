// Read-only workspace loading from a directory tree.
//
// Layout:
//   <root>/<project-dir>/project.toml
//   <root>/<project-dir>/<method-file>.json
//
// Project directories are visited in lexicographic order, which fixes the
// project IDs handed out by the HTTP API for the lifetime of the process.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    array::NdArray,
    workspace::{Analysis, AnalysisMethod, ModelError, Project, Workspace},
};

/// File name of the per-project manifest.
pub const PROJECT_MANIFEST: &str = "project.toml";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workspace directory {0} does not exist or is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid analysis file {path}: {source}")]
    AnalysisFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent workspace data in {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectManifest {
    name: Option<String>,
    dataset: String,
    #[serde(default)]
    model: Option<toml::Value>,
    #[serde(default)]
    analysis_methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodEntry {
    name: String,
    file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct MethodFile {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    clusterings: Vec<String>,
    #[serde(default)]
    embeddings: Vec<String>,
    #[serde(default)]
    analyses: Vec<AnalysisEntry>,
}

#[derive(Debug, Deserialize)]
struct AnalysisEntry {
    category: String,
    clustering: String,
    embedding: String,
    labels: NdArray,
    coordinates: NdArray,
    indices: NdArray,
}

impl From<AnalysisEntry> for Analysis {
    fn from(entry: AnalysisEntry) -> Self {
        Self {
            category_name: entry.category,
            clustering_name: entry.clustering,
            clustering: entry.labels,
            embedding_name: entry.embedding,
            embedding: entry.coordinates,
            indices: entry.indices,
        }
    }
}

/// Load every project below `root` into an in-memory [`Workspace`].
pub fn load_workspace(root: &Path) -> Result<Workspace, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::NotADirectory(root.to_path_buf()));
    }

    let mut project_dirs = Vec::new();
    let entries =
        std::fs::read_dir(root).map_err(|source| LoadError::Io { path: root.into(), source })?;
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io { path: root.into(), source })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if !path.join(PROJECT_MANIFEST).is_file() {
            warn!(path = %path.display(), "skipping directory without {PROJECT_MANIFEST}");
            continue;
        }
        project_dirs.push(path);
    }
    project_dirs.sort();

    let mut builder = Workspace::builder();
    for dir in project_dirs {
        let project = load_project(&dir)?;
        builder = builder
            .project(project)
            .map_err(|source| LoadError::Model { path: dir.clone(), source })?;
    }

    let workspace = builder.build();
    debug!(root = %root.display(), projects = workspace.project_count(), "workspace loaded");
    Ok(workspace)
}

/// Load a single project directory.
pub fn load_project(dir: &Path) -> Result<Project, LoadError> {
    let manifest_path = dir.join(PROJECT_MANIFEST);
    let contents = read_file(&manifest_path)?;
    let manifest: ProjectManifest = toml::from_str(&contents)
        .map_err(|source| LoadError::Manifest { path: manifest_path.clone(), source })?;

    let name = manifest.name.unwrap_or_else(|| directory_name(dir));
    let model = manifest.model.map(toml_to_json).unwrap_or(Value::Null);
    let mut builder = Project::builder(name, manifest.dataset).model(model);

    for entry in manifest.analysis_methods {
        let method_path = dir.join(&entry.file);
        let method = load_method(&entry.name, &method_path)?;
        builder = builder
            .analysis_method(method)
            .map_err(|source| LoadError::Model { path: manifest_path.clone(), source })?;
    }

    Ok(builder.build())
}

fn load_method(name: &str, path: &Path) -> Result<AnalysisMethod, LoadError> {
    let contents = read_file(path)?;
    let file: MethodFile = serde_json::from_str(&contents)
        .map_err(|source| LoadError::AnalysisFile { path: path.to_path_buf(), source })?;

    let mut builder = AnalysisMethod::builder(name);
    for category in file.categories {
        builder = builder.category(category);
    }
    for clustering in file.clusterings {
        builder = builder.clustering(clustering);
    }
    for embedding in file.embeddings {
        builder = builder.embedding(embedding);
    }
    for entry in file.analyses {
        builder = builder
            .analysis(entry.into())
            .map_err(|source| LoadError::Model { path: path.to_path_buf(), source })?;
    }

    Ok(builder.build())
}

/// Datetimes become their RFC 3339 text; non-finite floats become `null`.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => Value::from(number),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            Value::Object(table.into_iter().map(|(key, value)| (key, toml_to_json(value))).collect())
        }
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.into(), source })
}

fn directory_name(dir: &Path) -> String {
    dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}
