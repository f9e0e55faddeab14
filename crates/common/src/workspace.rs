// In-memory workspace model: projects, analysis methods and their analyses.
//
// The model is read-only once built. Lookups hand out borrows; nothing here
// mutates after construction.

use serde_json::Value;
use thiserror::Error;

use crate::array::NdArray;

/// A failed analysis lookup. Messages name the value that could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("The analysis method \"{method}\" does not exist.")]
    UnknownMethod { method: String },

    #[error("The category \"{category}\" does not exist for the analysis method \"{method}\".")]
    UnknownCategory { method: String, category: String },

    #[error("The clustering \"{clustering}\" does not exist for the analysis method \"{method}\".")]
    UnknownClustering { method: String, clustering: String },

    #[error("The embedding \"{embedding}\" does not exist for the analysis method \"{method}\".")]
    UnknownEmbedding { method: String, embedding: String },

    #[error(
        "No analysis was computed for the category \"{category}\", the clustering \
         \"{clustering}\" and the embedding \"{embedding}\"."
    )]
    MissingAnalysis { method: String, category: String, clustering: String, embedding: String },
}

/// Errors raised while assembling a model through the builders.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate project name: {0}")]
    DuplicateProject(String),

    #[error("duplicate analysis method \"{method}\" in project \"{project}\"")]
    DuplicateMethod { project: String, method: String },

    #[error(
        "analysis method \"{method}\" in project \"{project}\" contains '-'; method names \
         use '_' and are hyphenated only over HTTP"
    )]
    HyphenatedMethod { project: String, method: String },

    #[error("analysis references undeclared {kind} \"{name}\" in method \"{method}\"")]
    UndeclaredName { method: String, kind: &'static str, name: String },

    #[error(
        "analysis for ({category}, {clustering}, {embedding}) is defined twice in method \
         \"{method}\""
    )]
    DuplicateAnalysis { method: String, category: String, clustering: String, embedding: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workspace {
    projects: Vec<Project>,
}

impl Workspace {
    pub fn builder() -> WorkspaceBuilder {
        WorkspaceBuilder::default()
    }

    /// Project names in enumeration order. Positions in this list are the
    /// project IDs exposed over HTTP.
    pub fn project_names(&self) -> Vec<&str> {
        self.projects.iter().map(|project| project.name.as_str()).collect()
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.name == name)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Project with the given ID, i.e. its position in [`Workspace::project_names`].
    pub fn project_at(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct WorkspaceBuilder {
    projects: Vec<Project>,
}

impl WorkspaceBuilder {
    pub fn project(mut self, project: Project) -> Result<Self, ModelError> {
        if self.projects.iter().any(|existing| existing.name == project.name) {
            return Err(ModelError::DuplicateProject(project.name));
        }
        self.projects.push(project);
        Ok(self)
    }

    pub fn build(self) -> Workspace {
        Workspace { projects: self.projects }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    name: String,
    /// Opaque model descriptor, passed through to clients untouched.
    model: Value,
    dataset: Dataset,
    methods: Vec<AnalysisMethod>,
}

impl Project {
    pub fn builder(name: impl Into<String>, dataset: impl Into<String>) -> ProjectBuilder {
        ProjectBuilder {
            name: name.into(),
            model: Value::Null,
            dataset: Dataset { name: dataset.into() },
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Value {
        &self.model
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn analysis_methods(&self) -> &[AnalysisMethod] {
        &self.methods
    }

    pub fn analysis_method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|method| method.name.as_str()).collect()
    }

    pub fn has_analysis_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn category_names(&self, method: &str) -> Result<&[String], LookupError> {
        self.require_method(method).map(AnalysisMethod::category_names)
    }

    pub fn clustering_names(&self, method: &str) -> Result<&[String], LookupError> {
        self.require_method(method).map(AnalysisMethod::clustering_names)
    }

    pub fn embedding_names(&self, method: &str) -> Result<&[String], LookupError> {
        self.require_method(method).map(AnalysisMethod::embedding_names)
    }

    /// Resolve the analysis for one category × clustering × embedding choice.
    pub fn analysis(
        &self,
        method: &str,
        category: &str,
        clustering: &str,
        embedding: &str,
    ) -> Result<&Analysis, LookupError> {
        self.require_method(method)?.analysis(category, clustering, embedding)
    }

    fn method(&self, name: &str) -> Option<&AnalysisMethod> {
        self.methods.iter().find(|method| method.name == name)
    }

    fn require_method(&self, name: &str) -> Result<&AnalysisMethod, LookupError> {
        self.method(name).ok_or_else(|| LookupError::UnknownMethod { method: name.to_owned() })
    }
}

#[derive(Debug)]
pub struct ProjectBuilder {
    name: String,
    model: Value,
    dataset: Dataset,
    methods: Vec<AnalysisMethod>,
}

impl ProjectBuilder {
    pub fn model(mut self, model: Value) -> Self {
        self.model = model;
        self
    }

    /// Method names must be in internal form so that the hyphenated name
    /// listed to clients maps back to exactly this method.
    pub fn analysis_method(mut self, method: AnalysisMethod) -> Result<Self, ModelError> {
        if method.name.contains('-') {
            return Err(ModelError::HyphenatedMethod { project: self.name, method: method.name });
        }
        if self.methods.iter().any(|existing| existing.name == method.name) {
            return Err(ModelError::DuplicateMethod { project: self.name, method: method.name });
        }
        self.methods.push(method);
        Ok(self)
    }

    pub fn build(self) -> Project {
        Project { name: self.name, model: self.model, dataset: self.dataset, methods: self.methods }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisMethod {
    name: String,
    categories: Vec<String>,
    clusterings: Vec<String>,
    embeddings: Vec<String>,
    analyses: Vec<Analysis>,
}

impl AnalysisMethod {
    pub fn builder(name: impl Into<String>) -> AnalysisMethodBuilder {
        AnalysisMethodBuilder {
            method: AnalysisMethod {
                name: name.into(),
                categories: Vec::new(),
                clusterings: Vec::new(),
                embeddings: Vec::new(),
                analyses: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_names(&self) -> &[String] {
        &self.categories
    }

    pub fn clustering_names(&self) -> &[String] {
        &self.clusterings
    }

    pub fn embedding_names(&self) -> &[String] {
        &self.embeddings
    }

    /// Names are checked in category, clustering, embedding order so the error
    /// points at the first unresolvable choice.
    pub fn analysis(
        &self,
        category: &str,
        clustering: &str,
        embedding: &str,
    ) -> Result<&Analysis, LookupError> {
        if !self.categories.iter().any(|name| name == category) {
            return Err(LookupError::UnknownCategory {
                method: self.name.clone(),
                category: category.to_owned(),
            });
        }
        if !self.clusterings.iter().any(|name| name == clustering) {
            return Err(LookupError::UnknownClustering {
                method: self.name.clone(),
                clustering: clustering.to_owned(),
            });
        }
        if !self.embeddings.iter().any(|name| name == embedding) {
            return Err(LookupError::UnknownEmbedding {
                method: self.name.clone(),
                embedding: embedding.to_owned(),
            });
        }

        self.analyses
            .iter()
            .find(|analysis| analysis.matches(category, clustering, embedding))
            .ok_or_else(|| LookupError::MissingAnalysis {
                method: self.name.clone(),
                category: category.to_owned(),
                clustering: clustering.to_owned(),
                embedding: embedding.to_owned(),
            })
    }
}

#[derive(Debug)]
pub struct AnalysisMethodBuilder {
    method: AnalysisMethod,
}

impl AnalysisMethodBuilder {
    pub fn category(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.method.categories, name.into());
        self
    }

    pub fn clustering(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.method.clusterings, name.into());
        self
    }

    pub fn embedding(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.method.embeddings, name.into());
        self
    }

    /// Add a computed analysis. Its names must already be declared on the method.
    pub fn analysis(mut self, analysis: Analysis) -> Result<Self, ModelError> {
        let method = &self.method;
        let declared = [
            ("category", &method.categories, &analysis.category_name),
            ("clustering", &method.clusterings, &analysis.clustering_name),
            ("embedding", &method.embeddings, &analysis.embedding_name),
        ];
        for (kind, names, name) in declared {
            if !names.contains(name) {
                return Err(ModelError::UndeclaredName {
                    method: method.name.clone(),
                    kind,
                    name: name.clone(),
                });
            }
        }

        if method.analyses.iter().any(|existing| {
            existing.matches(
                &analysis.category_name,
                &analysis.clustering_name,
                &analysis.embedding_name,
            )
        }) {
            return Err(ModelError::DuplicateAnalysis {
                method: method.name.clone(),
                category: analysis.category_name,
                clustering: analysis.clustering_name,
                embedding: analysis.embedding_name,
            });
        }

        self.method.analyses.push(analysis);
        Ok(self)
    }

    pub fn build(self) -> AnalysisMethod {
        self.method
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Result of combining one category, clustering and embedding under a method.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub category_name: String,
    pub clustering_name: String,
    /// Cluster label per sample.
    pub clustering: NdArray,
    pub embedding_name: String,
    /// Embedded coordinates per sample.
    pub embedding: NdArray,
    /// Dataset indices of the samples in this category.
    pub indices: NdArray,
}

impl Analysis {
    fn matches(&self, category: &str, clustering: &str, embedding: &str) -> bool {
        self.category_name == category
            && self.clustering_name == clustering
            && self.embedding_name == embedding
    }
}
