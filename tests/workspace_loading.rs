/// Project loader fixtures: manifest-only workspace discovery, folder
/// walking, and an end-to-end run over a loaded fixture.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use seqcraft::application::GenerateUsecase;
use seqcraft::infrastructure::{ProjectLoader, SynModelBuilder};
use seqcraft::ports::plantuml_exporter::PlantUmlExporter;

fn write_member(root: &Path, name: &str, lib_code: &str) {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(
        dir.join("Cargo.toml"),
        format!(
            "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
            name
        ),
    )
    .unwrap();
    fs::write(dir.join("src/lib.rs"), lib_code).unwrap();
}

#[test]
fn test_manifest_only_workspace_discovery() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(
        root.join("Cargo.toml"),
        "[workspace]\nmembers = [\"member_a\", \"member_b\"]\n",
    )
    .unwrap();
    write_member(root, "member_a", "pub struct A;");
    write_member(root, "member_b", "pub struct B;");

    let files =
        ProjectLoader::load_from_manifest(root.join("Cargo.toml").to_str().unwrap()).unwrap();

    assert_eq!(files.len(), 2);
    let mut crates: Vec<&str> = files.iter().map(|f| f.crate_name.as_str()).collect();
    crates.sort();
    assert_eq!(crates, ["member_a", "member_b"]);
}

#[test]
fn test_manifest_only_single_package() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"solo\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    )
    .unwrap();
    fs::write(root.join("src/lib.rs"), "pub struct Solo;").unwrap();
    fs::write(root.join("src/extra.rs"), "pub struct Extra;").unwrap();

    let files =
        ProjectLoader::load_from_manifest(root.join("Cargo.toml").to_str().unwrap()).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.crate_name == "solo"));
}

#[test]
fn test_load_folder_walks_recursively_and_skips_target() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("mycrate");
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::create_dir_all(root.join("target")).unwrap();
    fs::write(root.join("src/lib.rs"), "pub struct A;").unwrap();
    fs::write(root.join("src/nested/deep.rs"), "pub struct B;").unwrap();
    fs::write(root.join("target/generated.rs"), "pub struct Skip;").unwrap();
    fs::write(root.join("notes.txt"), "not rust").unwrap();

    let files = ProjectLoader::load_folder(&root).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.crate_name == "mycrate"));
    assert!(files.iter().all(|f| !f.path.contains("target")));
}

#[test]
fn test_load_file_uses_stem_as_crate_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.rs");
    fs::write(&path, "pub struct S;").unwrap();

    let file = ProjectLoader::load_file(&path).unwrap();
    assert_eq!(file.crate_name, "sample");
    assert!(file.code.contains("struct S"));
}

#[test]
fn test_end_to_end_over_loaded_fixture() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("Cargo.toml"), "[workspace]\nmembers = [\"app\"]\n").unwrap();
    write_member(
        root,
        "app",
        r#"
pub struct Greeter;
impl Greeter {
    pub fn greet(&self) { self.format_name(); }
    fn format_name(&self) -> String { String::new() }
}
"#,
    );

    let sources =
        ProjectLoader::load_from_manifest(root.join("Cargo.toml").to_str().unwrap()).unwrap();

    let out_dir = root.join("diagrams");
    let usecase = GenerateUsecase {
        model_builder: &SynModelBuilder,
        exporter: &PlantUmlExporter,
    };
    let count = usecase.run(&sources, &out_dir).unwrap();

    assert_eq!(count, 1);
    let text = fs::read_to_string(out_dir.join("app_Greeter_greet.puml")).unwrap();
    assert!(text.contains("title app_Greeter_greet"));
    assert!(text.contains("Greeter -> Greeter: format_name"));
    assert!(text.contains("Greeter --> Greeter: String"));
}
