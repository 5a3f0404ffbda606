use std::path::Path;

use crate::domain::model::{ProgramModel, SourceFile};
use crate::domain::store::DiagramStore;

pub mod json_exporter;
pub mod plantuml_exporter;

/// Builds the whole-program source model from discovered sources.
pub trait ModelBuilder {
    fn build(&self, sources: &[SourceFile]) -> ProgramModel;
}

/// Writes finalized diagrams somewhere useful.
pub trait DiagramExporter {
    fn export(&self, diagrams: &DiagramStore, out_dir: &Path) -> std::io::Result<()>;
}
