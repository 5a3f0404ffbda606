use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cargo_metadata::MetadataCommand;

use crate::domain::model::SourceFile;

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load all source files from a Cargo workspace manifest.
    ///
    /// Goes through `cargo metadata` for exact target layout; when that is
    /// unavailable (no cargo on PATH, offline sandbox) it falls back to
    /// reading `[workspace] members` out of the manifest directly.
    pub fn load_workspace(manifest_path: &str) -> Result<Vec<SourceFile>> {
        match Self::load_with_cargo_metadata(manifest_path) {
            Ok(files) => Ok(files),
            Err(e) => {
                eprintln!(
                    "[seqcraft] WARN: cargo metadata unavailable ({}); falling back to manifest parsing",
                    e
                );
                Self::load_from_manifest(manifest_path)
            }
        }
    }

    fn load_with_cargo_metadata(manifest_path: &str) -> Result<Vec<SourceFile>> {
        let metadata = MetadataCommand::new()
            .manifest_path(manifest_path)
            .no_deps()
            .exec()
            .context("Failed to execute cargo metadata")?;

        let mut files = Vec::new();

        for package_id in &metadata.workspace_members {
            if let Some(package) = metadata.packages.iter().find(|p| &p.id == package_id) {
                for target in &package.targets {
                    // lib/bin targets carry the source code we analyze
                    if !target
                        .kind
                        .iter()
                        .any(|k| k == "lib" || k == "bin" || k == "proc-macro")
                    {
                        continue;
                    }

                    let src_path = &target.src_path;
                    let src_dir = src_path.parent().unwrap_or(src_path);
                    Self::collect_rs_recursive(src_dir.as_std_path(), &package.name, &mut files)?;
                }
            }
        }

        // Dedup files if multiple targets point to the same source tree
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        Ok(files)
    }

    /// Manifest-only workspace discovery: `[workspace] members` for
    /// workspaces, `[package]` for single crates. Glob members need cargo
    /// metadata and are skipped with a warning.
    pub fn load_from_manifest(manifest_path: &str) -> Result<Vec<SourceFile>> {
        let toml_content = fs::read_to_string(manifest_path)
            .with_context(|| format!("Cannot read manifest {}", manifest_path))?;
        let parsed: toml::Value = toml::from_str(&toml_content).context("Invalid manifest")?;
        let root = Path::new(manifest_path).parent().unwrap_or(Path::new("."));

        let mut files = Vec::new();

        if let Some(members) = parsed
            .get("workspace")
            .and_then(|w| w.get("members"))
            .and_then(|m| m.as_array())
        {
            for member in members {
                let Some(rel) = member.as_str() else { continue };
                if rel.contains('*') {
                    eprintln!(
                        "[seqcraft] WARN: glob members are not expanded without cargo metadata: {}",
                        rel
                    );
                    continue;
                }
                let member_dir = root.join(rel);
                let crate_name = Self::package_name(&member_dir.join("Cargo.toml"))
                    .unwrap_or_else(|| rel.replace(['/', '\\'], "_"));
                let src_dir = member_dir.join("src");
                if src_dir.exists() {
                    Self::collect_rs_recursive(&src_dir, &crate_name, &mut files)?;
                }
            }
        } else if parsed.get("package").is_some() {
            let crate_name = Self::package_name(Path::new(manifest_path))
                .unwrap_or_else(|| "crate".to_string());
            let src_dir = root.join("src");
            if src_dir.exists() {
                Self::collect_rs_recursive(&src_dir, &crate_name, &mut files)?;
            }
        }

        Ok(files)
    }

    /// Load every `.rs` file under a folder, attributed to the folder name.
    pub fn load_folder(dir: &Path) -> Result<Vec<SourceFile>> {
        let crate_name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("crate")
            .to_string();
        let mut files = Vec::new();
        Self::collect_rs_recursive(dir, &crate_name, &mut files)?;
        Ok(files)
    }

    /// Load a single file, attributed to its stem.
    pub fn load_file(path: &Path) -> Result<SourceFile> {
        let code = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;
        let crate_name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("crate")
            .to_string();
        Ok(SourceFile {
            crate_name,
            path: path.display().to_string(),
            code,
        })
    }

    fn package_name(manifest: &Path) -> Option<String> {
        let content = fs::read_to_string(manifest).ok()?;
        let parsed: toml::Value = toml::from_str(&content).ok()?;
        parsed
            .get("package")?
            .get("name")?
            .as_str()
            .map(str::to_string)
    }

    fn collect_rs_recursive(dir: &Path, crate_name: &str, out: &mut Vec<SourceFile>) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") {
            return Ok(());
        }
        if !dir.exists() {
            return Ok(());
        }

        if dir.is_file() {
            // Single-file targets (main.rs given directly)
            if dir.extension().is_some_and(|ext| ext == "rs") {
                let content = fs::read_to_string(dir)
                    .with_context(|| format!("Failed to read file {}", dir.display()))?;
                out.push(SourceFile {
                    crate_name: crate_name.to_string(),
                    path: dir.display().to_string(),
                    code: content,
                });
            }
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                Self::collect_rs_recursive(&path, crate_name, out)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read file {}", path.display()))?;
                out.push(SourceFile {
                    crate_name: crate_name.to_string(),
                    path: path.display().to_string(),
                    code: content,
                });
            }
        }
        Ok(())
    }
}
