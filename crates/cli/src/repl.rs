//! Interactive shell
//!
//! A small read-eval-print loop over the same engine as the one-shot
//! pipeline: `load` establishes the DEM (with sinks filled), `process`
//! derives the maps for one analysis, and `save`/`export` write out the
//! map belonging to the most recent process.

use crate::Process;
use anyhow::{Context, Result};
use clap::ValueEnum;
use demflow_algorithms::{
    aspect, fill_sinks, flow_direction, slope, FlowAccumulator, FlowMethod, SlopeComponent,
};
use demflow_colormap::{export_grid, ColourScheme, Palette};
use demflow_core::{Grid, GridFormat, ScalingMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Whichever map the most recent process produced. Flow and gradient
/// magnitudes are log-compressed before image export; direction codes
/// and aspect angles are rendered as they are.
enum ActiveMap {
    Directions(Grid<i32>),
    Magnitude(Grid<f64>),
    Aspect(Grid<f64>),
}

struct Session {
    dem: Option<Grid<f64>>,
    active: Option<ActiveMap>,
    data_root: PathBuf,
    rng: StdRng,
}

pub fn run(data_root: &Path, seed: Option<u64>) -> Result<()> {
    let stdin = std::io::stdin();
    let mut session = Session {
        dem: None,
        active: None,
        data_root: data_root.to_path_buf(),
        rng: match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        },
    };

    println!("demflow interactive shell; type 'help' for commands");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arguments: Vec<&str> = words.collect();

        let outcome = match command {
            "load" => session.load(&arguments),
            "process" => session.process(&arguments),
            "save" => session.save(&arguments),
            "export" => session.export(&arguments),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => break,
            other => {
                eprintln!("unknown command {other:?}; type 'help' for a list");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            eprintln!("error: {err:#}");
        }
    }

    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  load <file>               load a DEM (.txt, .csv or .bin) and fill its sinks");
    println!("  process <type>            run d8, dinf, mdf, slope or aspect");
    println!("  save <file>               write the current map as data");
    println!("  export <file> [colour]    write the current map as a BMP image");
    println!("  help                      show this text");
    println!("  quit                      leave the shell");
}

impl Session {
    fn load(&mut self, arguments: &[&str]) -> Result<()> {
        let [path] = arguments else {
            anyhow::bail!("usage: load <file>");
        };
        let path = Path::new(path);
        let format = GridFormat::from_extension(path)?;
        let dem = Grid::<f64>::load_from(path, format)
            .with_context(|| format!("cannot load {}", path.display()))?;
        if dem.is_empty() {
            anyhow::bail!("{} holds an empty grid", path.display());
        }

        self.dem = Some(fill_sinks(&dem));
        self.active = None;
        println!(
            "loaded {} ({} x {})",
            path.display(),
            dem.width(),
            dem.height()
        );
        Ok(())
    }

    fn process(&mut self, arguments: &[&str]) -> Result<()> {
        let [name] = arguments else {
            anyhow::bail!("usage: process <d8|dinf|mdf|slope|aspect>");
        };
        let process = Process::from_str(name, true)
            .map_err(|_| anyhow::anyhow!("unknown process {name:?}"))?;
        let dem = self.dem.as_ref().context("no DEM loaded; use 'load' first")?;

        self.active = Some(match process {
            Process::D8 => ActiveMap::Directions(flow_direction(dem, &mut self.rng)?),
            Process::Dinf => {
                // Accumulated flow is the interesting dinf output here;
                // gradient and aspect are its collaborators.
                let gradient = slope(dem, SlopeComponent::Combined)?;
                let azimuths = aspect(dem)?;
                let flow = FlowAccumulator::new(dem)
                    .with_aspect(&azimuths)
                    .with_gradient(&gradient)
                    .accumulate(FlowMethod::Dinf)?;
                ActiveMap::Magnitude(flow)
            }
            Process::Mdf => {
                let gradient = slope(dem, SlopeComponent::Combined)?;
                let flow = FlowAccumulator::new(dem)
                    .with_gradient(&gradient)
                    .accumulate(FlowMethod::Mdf)?;
                ActiveMap::Magnitude(flow)
            }
            Process::Slope => ActiveMap::Magnitude(slope(dem, SlopeComponent::Combined)?),
            Process::Aspect => ActiveMap::Aspect(aspect(dem)?),
        });
        println!("{name} analysis completed");
        Ok(())
    }

    fn save(&self, arguments: &[&str]) -> Result<()> {
        let [path] = arguments else {
            anyhow::bail!("usage: save <file>");
        };
        let path = Path::new(path);
        let format = GridFormat::from_extension(path)?;
        match self.active.as_ref().context("nothing to save; run 'process' first")? {
            ActiveMap::Directions(map) => map.save_to(path, format)?,
            ActiveMap::Magnitude(map) | ActiveMap::Aspect(map) => map.save_to(path, format)?,
        }
        println!("saved {}", path.display());
        Ok(())
    }

    fn export(&self, arguments: &[&str]) -> Result<()> {
        let (path, colour) = match arguments {
            [path] => (*path, "g1"),
            [path, colour] => (*path, *colour),
            _ => anyhow::bail!("usage: export <file> [colour]"),
        };
        let scheme = ColourScheme::from_shortcode(colour)?;
        let palette = Palette::load(&self.data_root, scheme)?;
        match self.active.as_ref().context("nothing to export; run 'process' first")? {
            ActiveMap::Directions(map) => export_grid(map, path, &palette, scheme)?,
            ActiveMap::Magnitude(map) => {
                let mut scaled = map.clone();
                scaled.apply_scaling(ScalingMode::Log);
                export_grid(&scaled, path, &palette, scheme)?;
            }
            ActiveMap::Aspect(map) => export_grid(map, path, &palette, scheme)?,
        }
        println!("exported {path}");
        Ok(())
    }
}
