//! nyaconv CLI
//!
//! Command-line interface for converting Wavefront OBJ models to the Sega
//! Saturn NYA mesh format and inspecting NYA files.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use nyaconv_export::{AnyMeshGroup, ExportReport, MeshKind, NyaExportOptions, NyaExporter};

mod import;

use import::ImportOptions;

/// nyaconv - mesh converter for the Sega Saturn NYA format
#[derive(Parser)]
#[command(name = "nyaconv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for reports
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Mesh kind as given on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MeshType(MeshKind);

impl std::str::FromStr for MeshType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(MeshType(MeshKind::Flat)),
            "smooth" => Ok(MeshType(MeshKind::Smooth)),
            _ => Err(format!("Unknown mesh type: {} (expected flat or smooth)", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert OBJ models to a NYA file
    Export(ExportArgs),

    /// Show the contents of a NYA file
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Input OBJ files, merged in order
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output NYA file
    #[arg(short, long)]
    output: PathBuf,

    /// Mesh type: flat or smooth
    #[arg(long = "type", default_value = "flat")]
    mesh_type: MeshType,

    /// Write material textures as they are instead of baking UV tiles
    #[arg(long)]
    no_unwrap: bool,

    /// Sort models by name before export
    #[arg(long)]
    sort_models: bool,

    /// Scale vertex positions
    #[arg(short, long, default_value = "1.0")]
    scale: f64,
}

#[derive(Args)]
struct InspectArgs {
    /// Path to the NYA file
    path: PathBuf,

    /// Write every texture as a PNG into this directory
    #[arg(long)]
    dump_textures: Option<PathBuf>,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_thread_ids(verbosity >= 3)
        .with_file(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    if !(args.scale.is_finite() && args.scale > 0.0) {
        bail!("Scale must be a positive number, got {}", args.scale);
    }

    let import_options = ImportOptions { scale: args.scale };
    let mut group = import::load_all(&args.input, &import_options)?;
    if args.sort_models {
        group.sort_models_by_name();
    }
    info!(
        files = args.input.len(),
        models = group.models.len(),
        faces = group.face_count(),
        "Loaded input"
    );

    let exporter = NyaExporter::with_options(NyaExportOptions {
        mesh_kind: args.mesh_type.0,
        unwrap_textures: !args.no_unwrap,
    });
    let report = exporter
        .export_to_file(&group, &args.output)
        .with_context(|| format!("Failed to export {}", args.output.display()))?;

    print_report(&args.output, &report, format)
}

fn print_report(output: &std::path::Path, report: &ExportReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!("NYA file: {}", output.display());
            println!("  Mesh type:      {}", report.mesh_kind);
            println!("  Meshes:         {}", report.mesh_count);
            println!("  Points:         {}", report.point_count);
            println!("  Polygons:       {}", report.polygon_count);
            println!("  Textures:       {}", report.texture_count);
            println!("  Texture data:   {}", format_size(report.texture_bytes as u64));
            println!("  Total size:     {}", format_size(report.total_bytes as u64));
        }
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let path = &args.path;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let group = AnyMeshGroup::decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))?;
    let summary = group.summary();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": path,
                "size": bytes.len(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("NYA file: {}", path.display());
            println!("  Mesh type:      {}", summary.kind);
            println!("  Size:           {}", format_size(bytes.len() as u64));
            println!("  Points:         {}", summary.point_count());
            println!("  Polygons:       {}", summary.polygon_count());

            println!("\nMeshes:");
            for (i, mesh) in summary.meshes.iter().enumerate() {
                println!(
                    "  {:>4}  {:>6} points  {:>6} polygons  {:>6} textured",
                    i, mesh.points, mesh.polygons, mesh.textured_faces
                );
            }

            println!("\nTextures:");
            for (i, texture) in summary.textures.iter().enumerate() {
                println!(
                    "  {:>4}  {:>5}x{:<5}  crc32 {:08x}",
                    i, texture.width, texture.height, texture.crc32
                );
            }
        }
    }

    if let Some(dir) = &args.dump_textures {
        dump_textures(&group, dir)?;
    }

    Ok(())
}

fn dump_textures(group: &AnyMeshGroup, dir: &std::path::Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    for (i, texture) in group.textures().iter().enumerate() {
        let path = dir.join(format!("texture_{:04}.png", i));
        let Some(image) = texture.to_image() else {
            bail!("Texture {} has inconsistent dimensions", i);
        };
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(count = group.textures().len(), dir = %dir.display(), "Dumped textures");
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
