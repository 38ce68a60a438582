//! sdfcad CLI - render and benchmark the built-in parts

mod parts;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use parts::{Part, Shape};
use sdfcad_core::bench::{self, DEFAULT_EVALUATIONS};
use sdfcad_core::export::ExportFormat;
use sdfcad_core::prelude::*;
use sdfcad_core::render::{render_dxf_with, render_png_with, render_stl_with, render_svg_with};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sdfcad")]
#[command(about = "Solid modeling with signed distance fields", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a built-in part to a file
    Render {
        /// Part to render
        part: Part,

        /// Output file (.stl, .dxf, .svg or .png)
        #[arg(short, long)]
        output: PathBuf,

        /// Cells across the longest side of the part
        #[arg(short, long)]
        resolution: Option<u32>,

        /// JSON render profile
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Measure field evaluation speed
    Bench {
        /// Part to measure (all parts when omitted)
        part: Option<Part>,

        /// Number of evaluations
        #[arg(short = 'n', long, default_value_t = DEFAULT_EVALUATIONS)]
        evaluations: usize,
    },

    /// List the built-in parts
    List,
}

/// Render settings loaded from `--config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct RenderProfile {
    mesh: MeshConfig,
    contour: ContourConfig,
    png: PngConfig,
    stl: StlEncoding,
}

impl RenderProfile {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading render profile {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing render profile {}", path.display()))
    }

    fn with_resolution(mut self, resolution: u32) -> Self {
        self.mesh.resolution = resolution;
        self.contour.resolution = resolution;
        self
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            part,
            output,
            resolution,
            config,
        } => {
            run_render(part, &output, resolution, config.as_deref())?;
        }
        Commands::Bench { part, evaluations } => {
            run_bench(part, evaluations)?;
        }
        Commands::List => {
            run_list();
        }
    }

    Ok(())
}

fn run_render(
    part: Part,
    output: &Path,
    resolution: Option<u32>,
    config: Option<&Path>,
) -> Result<()> {
    let format = ExportFormat::from_extension(output)
        .with_context(|| format!("unsupported output format: {}", output.display()))?;
    let mut profile = match config {
        Some(path) => RenderProfile::load(path)?,
        None => RenderProfile::default(),
    };
    if let Some(r) = resolution {
        profile = profile.with_resolution(r);
    }

    let start = Instant::now();
    let shape = part.build()?;
    if format == ExportFormat::Stl {
        let Shape::Solid(solid) = shape else {
            bail!("{part} is a 2D profile, STL output needs a solid");
        };
        let mesh = render_stl_with(&solid, output, &profile.mesh, profile.stl)?;
        println!(
            "{}: {} triangles, {} vertices",
            output.display(),
            mesh.triangle_count(),
            mesh.vertex_count()
        );
    } else {
        let field = match shape {
            // 2D output of a solid is its cross-section at z = 0
            Shape::Solid(solid) => solid.slice(DVec3::ZERO, DVec3::Z)?,
            Shape::Profile(field) => field,
        };
        if format == ExportFormat::Png {
            let raster = render_png_with(&field, output, &profile.png)?;
            println!(
                "{}: {}x{} pixels",
                output.display(),
                raster.width,
                raster.height
            );
        } else {
            let contours = if format == ExportFormat::Dxf {
                render_dxf_with(&field, output, &profile.contour)?
            } else {
                render_svg_with(&field, output, &profile.contour)?
            };
            println!(
                "{}: {} contours ({} holes), {} points",
                output.display(),
                contours.len(),
                contours.hole_count(),
                contours.point_count()
            );
        }
    }

    tracing::info!("{} done in {:.2?}", format.name(), start.elapsed());
    Ok(())
}

fn run_bench(part: Option<Part>, evaluations: usize) -> Result<()> {
    let selected: Vec<Part> = match part {
        Some(p) => vec![p],
        None => Part::value_variants().to_vec(),
    };

    for part in selected {
        let (kind, report) = match part.build()? {
            Shape::Solid(s) => ("SDF3", bench::benchmark3(&s, evaluations)?),
            Shape::Profile(p) => ("SDF2", bench::benchmark2(&p, evaluations)?),
        };
        println!("{part} {kind} {report}");
    }
    Ok(())
}

fn run_list() {
    for part in Part::value_variants() {
        println!("{:<12} {}", part.name(), part.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_arguments_parse() {
        let cli = Cli::try_parse_from([
            "sdfcad", "render", "box-lid", "-o", "lid.stl", "-r", "120",
        ])
        .unwrap();
        let Commands::Render {
            part,
            output,
            resolution,
            config,
        } = cli.command
        else {
            panic!("expected render");
        };
        assert_eq!(part, Part::BoxLid);
        assert_eq!(output, PathBuf::from("lid.stl"));
        assert_eq!(resolution, Some(120));
        assert!(config.is_none());
    }

    #[test]
    fn bench_defaults_to_every_part() {
        let cli = Cli::try_parse_from(["sdfcad", "bench"]).unwrap();
        let Commands::Bench { part, evaluations } = cli.command else {
            panic!("expected bench");
        };
        assert!(part.is_none());
        assert_eq!(evaluations, DEFAULT_EVALUATIONS);
    }

    #[test]
    fn profile_fills_missing_fields() {
        let profile: RenderProfile =
            serde_json::from_str(r#"{"mesh": {"resolution": 64}, "stl": "ascii"}"#).unwrap();
        assert_eq!(profile.mesh.resolution, 64);
        assert!(profile.mesh.adaptive);
        assert_eq!(profile.stl, StlEncoding::Ascii);
        assert_eq!(profile.contour, ContourConfig::default());

        let both = profile.with_resolution(10);
        assert_eq!(both.mesh.resolution, 10);
        assert_eq!(both.contour.resolution, 10);
    }
}
