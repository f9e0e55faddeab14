// vispr-common: workspace model shared by the VISPR crates

pub mod array;
pub mod loader;
pub mod naming;
pub mod workspace;

pub use array::NdArray;
pub use workspace::{Analysis, AnalysisMethod, LookupError, Project, Workspace};
