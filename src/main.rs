// Command-line entry point for SeqCraft.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;

use seqcraft::application::GenerateUsecase;
use seqcraft::infrastructure::{concurrency, ProjectLoader, SynModelBuilder};
use seqcraft::ports::json_exporter::JsonExporter;
use seqcraft::ports::plantuml_exporter::PlantUmlExporter;
use seqcraft::ports::DiagramExporter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input source file path (can specify multiple)
    #[arg(short, long, required = false)]
    input: Vec<String>,

    /// Input source folder(s)
    #[arg(short = 'd', long, required = false)]
    folder: Vec<String>,

    /// Workspace Cargo.toml
    #[arg(long, required = false)]
    workspace: Option<String>,

    /// Output directory for diagrams
    #[arg(short, long, default_value = "diagrams")]
    output: String,

    /// Output format (puml, json)
    #[arg(short, long, default_value = "puml")]
    format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = concurrency::init_thread_pool() {
        eprintln!("[seqcraft] WARN: thread pool already initialized: {}", e);
    }

    let mut sources = Vec::new();

    for input_file in &cli.input {
        match ProjectLoader::load_file(Path::new(input_file)) {
            Ok(file) => sources.push(file),
            Err(e) => eprintln!("[seqcraft] WARN: cannot read input file {}: {}", input_file, e),
        }
    }

    for folder in &cli.folder {
        sources.extend(ProjectLoader::load_folder(Path::new(folder))?);
    }

    if let Some(manifest) = &cli.workspace {
        let ws_sources = ProjectLoader::load_workspace(manifest)?;
        println!(
            "[seqcraft] workspace collected {} .rs files",
            ws_sources.len()
        );
        sources.extend(ws_sources);
    }

    if sources.is_empty() {
        bail!("Please provide at least one --input <file> or --folder <dir> or --workspace <Cargo.toml>");
    }

    let exporter: Box<dyn DiagramExporter> = match cli.format.as_str() {
        "puml" | "plantuml" => Box::new(PlantUmlExporter),
        "json" => Box::new(JsonExporter),
        other => bail!("Unknown output format: {}", other),
    };

    let usecase = GenerateUsecase {
        model_builder: &SynModelBuilder,
        exporter: exporter.as_ref(),
    };

    let count = usecase.run(&sources, Path::new(&cli.output))?;

    println!(
        "[seqcraft] {} diagram(s) written to {} (format: {})",
        count, cli.output, cli.format
    );

    Ok(())
}
