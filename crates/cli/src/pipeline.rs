//! One-shot pipeline orchestration
//!
//! Runs the selected process over the conditioned DEM, then whichever of
//! flow accumulation, watershed delineation and data/image output the
//! flags asked for.

use crate::{Process, WatershedRequest};
use anyhow::{bail, Context, Result};
use demflow_algorithms::{
    aspect, flow_direction, slope, FlowAccumulator, FlowMethod, PourPointMethod, SlopeComponent,
    WatershedAnalyser,
};
use demflow_colormap::{export_grid, ColourScheme, Palette};
use demflow_core::{Grid, GridFormat, ScalingMode};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct Request {
    pub process: Process,
    pub accumulate: bool,
    pub watershed: Option<WatershedRequest>,
    pub output: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub input_format: GridFormat,
    pub colour: String,
    pub data_root: PathBuf,
    pub seed: Option<u64>,
}

/// Maps derived by the selected process.
#[derive(Default)]
struct DerivedMaps {
    d8: Option<Grid<i32>>,
    gradient: Option<Grid<f64>>,
    aspect: Option<Grid<f64>>,
}

pub fn execute(dem: &Grid<f64>, request: Request) -> Result<()> {
    let mut rng = seeded_rng(request.seed);

    let mut maps = DerivedMaps::default();
    match request.process {
        Process::D8 => {
            maps.d8 = Some(flow_direction(dem, &mut rng)?);
        }
        Process::Dinf => {
            maps.gradient = Some(slope(dem, SlopeComponent::Combined)?);
            maps.aspect = Some(aspect(dem)?);
        }
        Process::Mdf | Process::Slope => {
            maps.gradient = Some(slope(dem, SlopeComponent::Combined)?);
        }
        Process::Aspect => {
            maps.aspect = Some(aspect(dem)?);
        }
    }

    if let Some(watershed) = &request.watershed {
        return delineate_watersheds(dem, &mut maps, &mut rng, watershed, &request);
    }

    let flow = if request.accumulate {
        Some(accumulate(dem, &maps, request.process)?)
    } else {
        None
    };

    write_outputs(&maps, flow, &request)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn flow_method(process: Process) -> Result<FlowMethod> {
    match process {
        Process::D8 => Ok(FlowMethod::D8),
        Process::Dinf => Ok(FlowMethod::Dinf),
        Process::Mdf => Ok(FlowMethod::Mdf),
        Process::Slope | Process::Aspect => {
            bail!("process has no flow model")
        }
    }
}

fn accumulate(dem: &Grid<f64>, maps: &DerivedMaps, process: Process) -> Result<Grid<f64>> {
    let mut accumulator = FlowAccumulator::new(dem);
    if let Some(map) = &maps.d8 {
        accumulator = accumulator.with_d8(map);
    }
    if let Some(map) = &maps.aspect {
        accumulator = accumulator.with_aspect(map);
    }
    if let Some(map) = &maps.gradient {
        accumulator = accumulator.with_gradient(map);
    }

    let flow = accumulator.accumulate(flow_method(process)?)?;
    info!("flow accumulation finished");
    Ok(flow)
}

fn delineate_watersheds(
    dem: &Grid<f64>,
    maps: &mut DerivedMaps,
    rng: &mut StdRng,
    watershed: &WatershedRequest,
    request: &Request,
) -> Result<()> {
    // Pour points for the dinf and mdf models still come from a D8
    // escape scan, so derive a direction map when the process did not.
    let pour_method = match request.process {
        Process::Mdf => PourPointMethod::Mdf,
        _ => PourPointMethod::D8,
    };
    if pour_method == PourPointMethod::D8 && maps.d8.is_none() {
        maps.d8 = Some(flow_direction(dem, rng)?);
    }

    let flow = accumulate(dem, maps, request.process)?;

    let mut analyser = WatershedAnalyser::new(dem).with_flow(&flow);
    if let Some(map) = &maps.d8 {
        analyser = analyser.with_d8(map);
    }
    if let Some(map) = &maps.aspect {
        analyser = analyser.with_aspect(map);
    }

    let points = analyser.pour_points(watershed.count, pour_method)?;
    if points.is_empty() {
        warn!("no pour points qualified; nothing to delineate");
        return Ok(());
    }

    let scheme = ColourScheme::from_shortcode(&watershed.colour)?;
    let palette = Palette::load(&request.data_root, scheme)?;
    let method = flow_method(request.process)?;

    let bar = ProgressBar::new(points.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}") {
        bar.set_style(style);
    }
    bar.set_message("tracing watersheds");

    for (index, &point) in points.iter().enumerate() {
        let mut catchment = analyser.watershed(point, method)?;
        catchment.apply_scaling(ScalingMode::Log);

        let path = format!("{}_{}.bmp", watershed.stem, index);
        export_grid(&catchment, &path, &palette, scheme)
            .with_context(|| format!("cannot export {path}"))?;
        bar.inc(1);
    }
    bar.finish_with_message("watersheds exported");

    info!(count = points.len(), "watershed delineation finished");
    Ok(())
}

fn write_outputs(maps: &DerivedMaps, flow: Option<Grid<f64>>, request: &Request) -> Result<()> {
    if let Some(mut flow) = flow {
        if let Some(path) = &request.output {
            flow.save_to(path, request.input_format)?;
            info!(path = %path.display(), "saved flow accumulation map");
        }
        if let Some(path) = &request.image {
            flow.apply_scaling(ScalingMode::Log);
            export_image(&flow, path, &request.colour, &request.data_root)?;
        }
        return Ok(());
    }

    match request.process {
        Process::D8 => {
            if let Some(map) = &maps.d8 {
                if let Some(path) = &request.output {
                    map.save_to(path, request.input_format)?;
                    info!(path = %path.display(), "saved D8 direction map");
                }
                if let Some(path) = &request.image {
                    export_image(map, path, &request.colour, &request.data_root)?;
                }
            }
        }
        Process::Dinf | Process::Aspect => {
            if let Some(map) = &maps.aspect {
                if let Some(path) = &request.output {
                    map.save_to(path, request.input_format)?;
                    info!(path = %path.display(), "saved aspect map");
                }
                if let Some(path) = &request.image {
                    export_image(map, path, &request.colour, &request.data_root)?;
                }
            }
        }
        Process::Slope => {
            if let Some(map) = &maps.gradient {
                if request.output.is_some() {
                    warn!("slope has no data output; use --image");
                }
                if let Some(path) = &request.image {
                    export_image(map, path, &request.colour, &request.data_root)?;
                }
            }
        }
        Process::Mdf => {
            bail!("mdf has no output without flow accumulation (-a)");
        }
    }

    Ok(())
}

fn export_image<T: demflow_core::GridElement>(
    grid: &Grid<T>,
    path: &Path,
    colour: &str,
    data_root: &Path,
) -> Result<()> {
    let scheme = ColourScheme::from_shortcode(colour)?;
    let palette = Palette::load(data_root, scheme)
        .with_context(|| format!("cannot load colourmap {colour:?}"))?;
    export_grid(grid, path, &palette, scheme)?;
    info!(path = %path.display(), "saved image");
    Ok(())
}
