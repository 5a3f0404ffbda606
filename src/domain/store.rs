//! Diagram Store
//!
//! Title -> Command Buffer map owned by one traversal run. Diagram creation
//! is idempotent per title; finalization either appends the end marker or
//! evicts diagrams that never left the header block.

use std::collections::HashMap;

use crate::domain::buffer::CommandBuffer;

/// Number of header lines written when a diagram opens. A diagram survives
/// finalization only if it grew past the header; revisit if the header
/// block changes length.
pub const HEADER_LEN: usize = 4;

/// Per-run diagram table. Workers walking distinct compilation units each
/// own one and the results are merged afterwards.
#[derive(Debug, Default)]
pub struct DiagramStore {
    diagrams: HashMap<String, CommandBuffer>,
}

impl DiagramStore {
    /// Buffer for `title`, creating an empty one on first use and reusing
    /// the existing one if the same title recurs.
    pub fn begin_or_reuse(&mut self, title: &str) -> &mut CommandBuffer {
        self.diagrams.entry(title.to_string()).or_default()
    }

    /// Keep the diagram (appending the end marker) if it moved past the
    /// header block, otherwise remove the entry entirely.
    pub fn finalize(&mut self, title: &str) {
        let keep = self
            .diagrams
            .get(title)
            .map(|buf| buf.len() > HEADER_LEN)
            .unwrap_or(false);
        if keep {
            if let Some(buf) = self.diagrams.get_mut(title) {
                buf.push_line("@enduml");
            }
        } else {
            self.diagrams.remove(title);
        }
    }

    /// Fold another (already finalized) store into this one. Titles are
    /// unique per (crate, type, method) triple, so collisions only occur if
    /// the same method was walked twice; first writer wins.
    pub fn merge(&mut self, other: DiagramStore) {
        for (title, buf) in other.diagrams {
            self.diagrams.entry(title).or_insert(buf);
        }
    }

    pub fn get(&self, title: &str) -> Option<&CommandBuffer> {
        self.diagrams.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.diagrams.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.diagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty()
    }

    /// Diagrams in deterministic (title) order for export.
    pub fn iter_sorted(&self) -> Vec<(&str, &CommandBuffer)> {
        let mut entries: Vec<_> = self
            .diagrams
            .iter()
            .map(|(title, buf)| (title.as_str(), buf))
            .collect();
        entries.sort_by_key(|(title, _)| *title);
        entries
    }
}
