//! JSON Exporter
//!
//! Serializes the diagram set into a single `diagrams.json` document for
//! downstream tooling.

use std::fs;
use std::io::Result;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::store::DiagramStore;
use crate::ports::DiagramExporter;

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagramDto {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagramSetDto {
    pub diagrams: Vec<DiagramDto>,
}

impl From<&DiagramStore> for DiagramSetDto {
    fn from(store: &DiagramStore) -> Self {
        let diagrams = store
            .iter_sorted()
            .into_iter()
            .map(|(title, buf)| DiagramDto {
                title: title.to_string(),
                lines: buf.lines().to_vec(),
            })
            .collect();
        DiagramSetDto { diagrams }
    }
}

pub struct JsonExporter;

impl DiagramExporter for JsonExporter {
    fn export(&self, diagrams: &DiagramStore, out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir)?;
        let dto = DiagramSetDto::from(diagrams);
        let json = serde_json::to_string_pretty(&dto)?;
        fs::write(out_dir.join("diagrams.json"), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_is_sorted_by_title() {
        let mut store = DiagramStore::default();
        for title in ["z_Z_z", "a_A_a"] {
            let buf = store.begin_or_reuse(title);
            buf.push_line("@startuml");
        }
        let dto = DiagramSetDto::from(&store);
        let titles: Vec<&str> = dto.diagrams.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["a_A_a", "z_Z_z"]);
    }

    #[test]
    fn test_export_round_trips() {
        use tempfile::tempdir;

        let mut store = DiagramStore::default();
        let buf = store.begin_or_reuse("asm_Foo_m");
        buf.push_line("@startuml");
        buf.push_line("@enduml");

        let dir = tempdir().unwrap();
        JsonExporter.export(&store, dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join("diagrams.json")).unwrap();
        let parsed: DiagramSetDto = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.diagrams.len(), 1);
        assert_eq!(parsed.diagrams[0].title, "asm_Foo_m");
        assert_eq!(parsed.diagrams[0].lines, ["@startuml", "@enduml"]);
    }
}
