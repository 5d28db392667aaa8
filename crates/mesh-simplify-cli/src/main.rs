//! mesh-simplify: command-line mesh simplification and progressive-mesh
//! expansion.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable (or pass `-v`/`-vv`/`-vvv`) to
//! control log output:
//! - `RUST_LOG=mesh_simplify=info` - Basic operation logging
//! - `RUST_LOG=mesh_simplify=debug` - Detailed progress logging
//! - `RUST_LOG=mesh_simplify::timing=debug` - Performance timing
//!
//! # Example
//!
//! ```bash
//! # Simplify to 1000 faces, recording vertex splits
//! mesh-simplify bunny.obj -n 1000 -p -o bunny_1000.obj
//!
//! # Grow the progressive mesh back to 5000 faces
//! mesh-simplify bunny_1000.obj -n 5000 -r -o bunny_5000.obj
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mesh_simplify::{Mesh, SimplifyParams};

/// mesh-simplify - reduce a triangle mesh to a target face count.
///
/// Simplifies with the quadric-error pair-contraction algorithm, optionally
/// emitting reversible vertex-split records, and can replay recorded splits
/// to expand a progressive mesh back to a higher resolution.
#[derive(Parser)]
#[command(name = "mesh-simplify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input mesh file (.obj)
    input: PathBuf,

    /// Target face count
    #[arg(short = 'n', long = "target-faces", value_parser = clap::value_parser!(u64).range(1..))]
    target_faces: u64,

    /// Simplification algorithm
    #[arg(short = 'a', long, default_value = "pair-contract")]
    algorithm: Algorithm,

    /// Also pair vertices closer than this distance (0 disables)
    #[arg(short = 'd', long, default_value_t = 0.0)]
    distance_threshold: f64,

    /// Output file path (default: input basename + "_out" + extension)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Treat degenerate input faces as fatal instead of dropping them
    #[arg(short = 's', long)]
    strict: bool,

    /// Emit vertex-split records (error if the input already has them)
    #[arg(short = 'p', long, conflicts_with = "expand")]
    progressive: bool,

    /// Expand the input by replaying its vertex splits instead of simplifying
    #[arg(short = 'r', long)]
    expand: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Quadric-error pair contraction (Garland-Heckbert)
    PairContract,
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_simplify=info",
            2 => "mesh_simplify=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

/// Default output path: input basename + "_out" + input extension.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_out.{}", stem, ext),
        None => format!("{}_out", stem),
    };
    input.with_file_name(name)
}

fn run(cli: &Cli) -> Result<()> {
    let mesh = Mesh::load(&cli.input)
        .with_context(|| format!("Failed to load mesh from {:?}", cli.input))?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    let target_faces = cli.target_faces as usize;

    if cli.expand {
        println!(
            "Expanding mesh ({} faces, {} vsplits) to {} faces...",
            mesh.face_count(),
            mesh.split_count(),
            target_faces
        );

        let result = mesh
            .expand_to_count(target_faces)
            .with_context(|| format!("Failed to expand mesh from {:?}", cli.input))?;

        result
            .mesh
            .save(&output)
            .with_context(|| format!("Failed to save expanded mesh to {:?}", output))?;

        println!(
            "{} Expanded mesh saved to {}",
            "ok:".green().bold(),
            output.display()
        );
        println!(
            "  {}: {} → {} faces ({} splits replayed, {} remaining)",
            "Faces".cyan(),
            result.original_faces,
            result.final_faces,
            result.splits_replayed,
            result.mesh.split_count()
        );
        return Ok(());
    }

    let Algorithm::PairContract = cli.algorithm;
    let params = SimplifyParams {
        target_faces,
        record_splits: cli.progressive,
        strict: cli.strict,
        distance_threshold: cli.distance_threshold,
    };

    println!(
        "Simplifying mesh ({} faces) to {} faces...",
        mesh.face_count(),
        target_faces
    );

    let result = mesh
        .simplify_with_params(&params)
        .with_context(|| format!("Failed to simplify mesh from {:?}", cli.input))?;

    result
        .mesh
        .save(&output)
        .with_context(|| format!("Failed to save simplified mesh to {:?}", output))?;

    let reduction = if result.original_faces > 0 {
        1.0 - (result.final_faces as f64 / result.original_faces as f64)
    } else {
        0.0
    };

    println!(
        "{} Simplified mesh saved to {}",
        "ok:".green().bold(),
        output.display()
    );
    println!(
        "  {}: {} → {} triangles ({:.1}% reduction)",
        "Faces".cyan(),
        result.original_faces,
        result.final_faces,
        reduction * 100.0
    );
    println!(
        "  {}: {} pair contractions",
        "Operations".cyan(),
        result.contractions_performed
    );
    if result.degenerate_faces_dropped > 0 {
        println!(
            "  {}: {} degenerate faces dropped",
            "Warnings".yellow(),
            result.degenerate_faces_dropped
        );
    }
    if cli.progressive {
        println!(
            "  {}: {} vertex splits recorded",
            "Progressive".cyan(),
            result.mesh.split_count()
        );
    }

    Ok(())
}

fn main() {
    // Exit 0 for --help/--version, 1 for usage errors (clap defaults to 2)
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {}: {}", "Caused by".yellow(), cause);
        }
        std::process::exit(1);
    }
}
