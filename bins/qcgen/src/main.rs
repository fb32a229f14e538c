use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use geometry::prelude::Point;
use qcells::chips::ConcentricQubitsDemo;
use qcells::config::Config;
use qcells::elements::Marker;
use qcells::layout::{export_gds, Element, Layout};
use qcells::qubits::ConcentricTransmon;
use qcells::simulation::{create_xsection, WaveGuidesSim, XSectionParams};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to read layout configuration from {:?}.", path))?,
        None => Config::default(),
    };

    match args.command {
        Command::Chip { params, out } => {
            generate::<ConcentricQubitsDemo>(config, params.as_deref(), &out)
        }
        Command::Transmon { params, out } => {
            generate::<ConcentricTransmon>(config, params.as_deref(), &out)
        }
        Command::Marker { params, out } => generate::<Marker>(config, params.as_deref(), &out),
        Command::Xsection {
            sim,
            params,
            cut,
            out,
        } => xsection(sim.as_deref(), params.as_deref(), cut, out),
    }
}

/// Arguments to `qcgen`.
#[derive(ClapParser)]
#[command(
    version,
    about,
    long_about = "Generate superconducting circuit layouts and simulation cross sections"
)]
pub struct Args {
    /// A TOML file with layout settings such as the database unit and layer numbers.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the concentric qubits demonstration chip to a GDS file.
    Chip {
        /// A TOML file of chip parameters. Missing keys keep their defaults.
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// The output GDS file.
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Write a single concentric transmon to a GDS file.
    Transmon {
        /// A TOML file of qubit parameters.
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// The output GDS file.
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Write an alignment marker to a GDS file.
    Marker {
        /// A TOML file of marker parameters.
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// The output GDS file.
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Cut a waveguide simulation into a cross section and write it as JSON.
    Xsection {
        /// A TOML file of waveguide simulation parameters.
        #[arg(short, long)]
        sim: Option<PathBuf>,
        /// A TOML file of cross section parameters.
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// The cut line as `x0 y0 x1 y1`.
        ///
        /// Defaults to the vertical line through the middle of the simulation box.
        #[arg(long, num_args = 4, allow_negative_numbers = true)]
        cut: Option<Vec<f64>>,
        /// The output JSON file.
        ///
        /// If unspecified, the output will be written to stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Reads parameters from a TOML file, or takes the defaults.
fn load<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters from {:?}.", path))?;
    toml::from_str(&s).with_context(|| format!("Failed to parse parameters in {:?}.", path))
}

fn generate<E>(config: Config, params: Option<&Path>, out: &Path) -> anyhow::Result<()>
where
    E: Element + DeserializeOwned + Default,
{
    let element: E = load(params)?;
    let mut layout = Layout::new(config);
    let top = layout
        .build(&element)
        .with_context(|| format!("Failed to build {}.", E::NAME))?;
    let lib = export_gds(&layout, top, E::NAME).with_context(|| "Failed to convert to GDS.")?;
    lib.save(out)
        .with_context(|| format!("Failed to write GDS to {:?}.", out))?;
    eprintln!("Wrote {} cells to {:?}.", lib.structs.len(), out);
    Ok(())
}

fn xsection(
    sim: Option<&Path>,
    params: Option<&Path>,
    cut: Option<Vec<f64>>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let sim: WaveGuidesSim = load(sim)?;
    let params: XSectionParams = load(params)?;
    let cut = match cut.as_deref() {
        Some(&[x0, y0, x1, y1]) => (Point::new(x0, y0), Point::new(x1, y1)),
        Some(other) => anyhow::bail!("A cut needs 4 coordinates, got {}.", other.len()),
        None => {
            let b = sim.sim_box;
            let x = b.center().x;
            (Point::new(x, b.bot()), Point::new(x, b.top()))
        }
    };
    let geometry = sim
        .geometry()
        .with_context(|| "Failed to build the simulation geometry.")?;
    let section = create_xsection(&geometry, cut, &params)
        .with_context(|| "Failed to create the cross section.")?;
    let json = section.to_json()?;

    if let Some(path) = out {
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write cross section to {:?}.", path))?;
    } else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}").with_context(|| "Failed to write cross section to stdout.")?;
    }
    Ok(())
}
