//! demflow CLI — DEM flow-structure analysis

mod pipeline;
mod repl;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Analysis selected with `-p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Process {
    D8,
    Dinf,
    Mdf,
    Slope,
    Aspect,
}

impl Process {
    pub fn is_flow_model(self) -> bool {
        matches!(self, Process::D8 | Process::Dinf | Process::Mdf)
    }
}

#[derive(Parser)]
#[command(name = "demflow")]
#[command(version, about = "Flow direction, accumulation and watershed analysis over a DEM")]
struct Cli {
    /// Input DEM (.txt, .csv or .bin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Analysis to run
    #[arg(short, long, value_enum)]
    process: Option<Process>,

    /// Accumulate upslope contributing area for the chosen flow model
    #[arg(short = 'a', long = "accumulate", alias = "fa")]
    accumulate: bool,

    /// Watershed mode: pour-point count, output stem and an optional
    /// colourmap shortcode
    #[arg(short, long, num_args = 2..=3, value_names = ["K", "DIR", "COLOUR"])]
    watershed: Option<Vec<String>>,

    /// Data output path (.txt, .csv or .bin)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// BMP image output path
    #[arg(long)]
    image: Option<PathBuf>,

    /// Colourmap shortcode for image output
    #[arg(short, long, default_value = "g1")]
    colour: String,

    /// Directory holding colourmaps/<shortcode>.txt
    #[arg(long, default_value = "data")]
    data_root: PathBuf,

    /// Seed for the D8 tie-break generator
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Start the interactive shell instead of a one-shot run
    #[arg(long)]
    interactive: bool,
}

/// Parsed form of the `-w` value list.
pub struct WatershedRequest {
    pub count: usize,
    pub stem: String,
    pub colour: String,
}

fn parse_watershed(values: &[String]) -> Result<WatershedRequest> {
    let count: usize = values[0]
        .parse()
        .with_context(|| format!("invalid pour-point count {:?}", values[0]))?;
    if count == 0 {
        bail!("the pour-point count must be at least 1");
    }
    Ok(WatershedRequest {
        count,
        stem: values[1].clone(),
        colour: values.get(2).cloned().unwrap_or_else(|| "g1".to_string()),
    })
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.interactive {
        return repl::run(&cli.data_root, cli.seed);
    }

    let input = cli.input.context("an input DEM is required (-i)")?;
    let process = cli.process.context("a process is required (-p)")?;
    let watershed = cli
        .watershed
        .as_deref()
        .map(parse_watershed)
        .transpose()?;

    // Flag validation, before any file is touched.
    if cli.output.is_none() && cli.image.is_none() && watershed.is_none() {
        bail!("nothing to do: give at least one of -o, --image or -w");
    }
    if cli.accumulate && !process.is_flow_model() {
        bail!("flow accumulation needs a flow model process (d8, dinf or mdf)");
    }
    if cli.accumulate && watershed.is_some() {
        bail!("flow accumulation and watershed mode are mutually exclusive");
    }
    if watershed.is_some() && !process.is_flow_model() {
        bail!("watershed mode needs a flow model process (d8, dinf or mdf)");
    }

    let format = demflow_core::GridFormat::from_extension(&input)?;
    let dem = demflow_core::Grid::<f64>::load_from(&input, format)
        .with_context(|| format!("cannot load {}", input.display()))?;
    if dem.is_empty() {
        bail!("{} holds an empty grid", input.display());
    }
    tracing::debug!(
        width = dem.width(),
        height = dem.height(),
        "loaded input DEM"
    );

    let dem = demflow_algorithms::fill_sinks(&dem);

    let request = pipeline::Request {
        process,
        accumulate: cli.accumulate,
        watershed,
        output: cli.output,
        image: cli.image,
        input_format: format,
        colour: cli.colour,
        data_root: cli.data_root,
        seed: cli.seed,
    };
    pipeline::execute(&dem, request)
}
