//! PlantUML Exporter
//!
//! Writes each diagram buffer to `<out_dir>/<title>.puml`, directly
//! consumable by any PlantUML-compatible renderer.

use std::fs;
use std::io::Result;
use std::path::Path;

use crate::domain::buffer::CommandBuffer;
use crate::domain::store::DiagramStore;
use crate::ports::DiagramExporter;

pub struct PlantUmlExporter;

impl PlantUmlExporter {
    /// Render one buffer as PlantUML text.
    pub fn to_plantuml(buf: &CommandBuffer) -> String {
        let mut text = buf.lines().join("\n");
        text.push('\n');
        text
    }
}

impl DiagramExporter for PlantUmlExporter {
    fn export(&self, diagrams: &DiagramStore, out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir)?;
        for (title, buf) in diagrams.iter_sorted() {
            let path = out_dir.join(format!("{}.puml", title));
            fs::write(path, Self::to_plantuml(buf))?;
        }
        Ok(())
    }
}
