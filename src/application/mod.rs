use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::model::SourceFile;
use crate::domain::walker::DiagramWalker;
use crate::ports::{DiagramExporter, ModelBuilder};

/// End-to-end run: build the source model, walk it, export the diagrams.
pub struct GenerateUsecase<'a> {
    pub model_builder: &'a dyn ModelBuilder,
    pub exporter: &'a dyn DiagramExporter,
}

impl GenerateUsecase<'_> {
    /// Returns the number of diagrams exported.
    pub fn run(&self, sources: &[SourceFile], out_dir: &Path) -> Result<usize> {
        let model = self.model_builder.build(sources);
        let diagrams = DiagramWalker::process(&model);
        self.exporter
            .export(&diagrams, out_dir)
            .context("Failed to export diagrams")?;
        Ok(diagrams.len())
    }
}
