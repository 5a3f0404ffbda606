// Infrastructure implementations for SeqCraft.

pub mod concurrency;
pub mod project_loader;

use crate::domain::model::{ProgramModel, SourceFile};
use crate::ports::ModelBuilder;

pub use project_loader::ProjectLoader;

/// syn-backed source model provider: parses every unit and builds the
/// symbol and caller indices up front.
pub struct SynModelBuilder;

impl ModelBuilder for SynModelBuilder {
    fn build(&self, sources: &[SourceFile]) -> ProgramModel {
        ProgramModel::build(sources)
    }
}
