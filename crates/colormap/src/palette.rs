//! Colour palettes and shortcode resolution

use demflow_core::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// RGB colour with channels in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The palette shortcodes the image exporter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourScheme {
    /// Black to white (`g1`)
    Greyscale,
    /// White to black (`g2`)
    GreyscaleInverted,
    /// Blue through green to red (`dw`)
    DryWet,
    /// One bucket per direction code (`d8`)
    D8,
    /// Sea-floor sediment ramp (`sf`)
    SeaFloor,
}

impl ColourScheme {
    /// Resolve a shortcode (or long name) to a scheme.
    pub fn from_shortcode(code: &str) -> Result<Self> {
        match code {
            "g1" | "greyscale1" => Ok(ColourScheme::Greyscale),
            "g2" | "greyscale2" => Ok(ColourScheme::GreyscaleInverted),
            "dw" | "drywet" => Ok(ColourScheme::DryWet),
            "d8" => Ok(ColourScheme::D8),
            "sf" | "seafloor" => Ok(ColourScheme::SeaFloor),
            other => Err(Error::UnknownOption {
                kind: "colourmap shortcode",
                value: other.to_string(),
            }),
        }
    }

    /// Canonical shortcode, which is also the palette file stem.
    pub fn shortcode(&self) -> &'static str {
        match self {
            ColourScheme::Greyscale => "g1",
            ColourScheme::GreyscaleInverted => "g2",
            ColourScheme::DryWet => "dw",
            ColourScheme::D8 => "d8",
            ColourScheme::SeaFloor => "sf",
        }
    }

    /// Discrete schemes bucket values instead of interpolating; the D8
    /// palette maps one colour per direction code.
    pub fn is_discrete(&self) -> bool {
        matches!(self, ColourScheme::D8)
    }
}

/// An ordered list of colours read from a colourmap file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colours: Vec<Rgb>,
}

impl Palette {
    /// Build a palette from explicit colours.
    pub fn from_colours(colours: Vec<Rgb>) -> Result<Self> {
        if colours.is_empty() {
            return Err(Error::UnknownOption {
                kind: "palette",
                value: "empty colour list".to_string(),
            });
        }
        Ok(Self { colours })
    }

    /// Load `<data-root>/colourmaps/<shortcode>.txt`: one colour per
    /// line as three `B G R` integers.
    pub fn load(data_root: &Path, scheme: ColourScheme) -> Result<Self> {
        let path = data_root
            .join("colourmaps")
            .join(format!("{}.txt", scheme.shortcode()));
        let reader = BufReader::new(File::open(&path)?);

        let mut colours = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let mut channels = [0u8; 3];
            let mut count = 0;
            for token in trimmed.split_whitespace() {
                let value: u8 = token.parse().map_err(|_| Error::Parse {
                    value: token.to_string(),
                    line: index + 1,
                })?;
                if count < 3 {
                    channels[count] = value;
                }
                count += 1;
            }
            if count != 3 {
                return Err(Error::Parse {
                    value: trimmed.to_string(),
                    line: index + 1,
                });
            }

            let [b, g, r] = channels;
            colours.push(Rgb::new(r, g, b));
        }

        Self::from_colours(colours)
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Sample the palette at `t` in `[0, 1]` with piecewise-linear
    /// interpolation between adjacent colours.
    pub fn continuous(&self, t: f64) -> Rgb {
        let count = self.colours.len();
        if count == 1 || t <= 0.0 {
            return self.colours[0];
        }
        if t >= 1.0 {
            return self.colours[count - 1];
        }

        let segment = 1.0 / (count - 1) as f64;
        let mut index = (t / segment) as usize;
        if index >= count - 1 {
            index = count - 2;
        }
        let local = (t - index as f64 * segment) / segment;
        lerp(self.colours[index], self.colours[index + 1], local)
    }

    /// Sample the palette at `t` in `[0, 1]` by discrete bucket.
    pub fn discrete(&self, t: f64) -> Rgb {
        let count = self.colours.len();
        if t <= 0.0 {
            return self.colours[0];
        }
        if t >= 1.0 {
            return self.colours[count - 1];
        }

        let index = ((t * count as f64) as usize).min(count - 1);
        self.colours[index]
    }
}

fn lerp(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let channel = |a: u8, b: u8| (a as f64 + t * (b as f64 - a as f64)) as u8;
    Rgb::new(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop() -> Palette {
        Palette::from_colours(vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]).unwrap()
    }

    #[test]
    fn shortcodes_resolve() {
        assert_eq!(
            ColourScheme::from_shortcode("g1").unwrap(),
            ColourScheme::Greyscale
        );
        assert_eq!(
            ColourScheme::from_shortcode("drywet").unwrap(),
            ColourScheme::DryWet
        );
        assert!(ColourScheme::from_shortcode("rainbow").is_err());
    }

    #[test]
    fn continuous_interpolates_midpoint() {
        let palette = two_stop();
        let mid = palette.continuous(0.5);
        assert_eq!(mid, Rgb::new(127, 127, 127));
    }

    #[test]
    fn continuous_clamps_out_of_range() {
        let palette = two_stop();
        assert_eq!(palette.continuous(-1.0), Rgb::new(0, 0, 0));
        assert_eq!(palette.continuous(2.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn discrete_buckets_do_not_blend() {
        let palette = Palette::from_colours(vec![
            Rgb::new(10, 0, 0),
            Rgb::new(0, 10, 0),
            Rgb::new(0, 0, 10),
        ])
        .unwrap();
        assert_eq!(palette.discrete(0.1), Rgb::new(10, 0, 0));
        assert_eq!(palette.discrete(0.5), Rgb::new(0, 10, 0));
        assert_eq!(palette.discrete(0.9), Rgb::new(0, 0, 10));
    }

    #[test]
    fn palette_file_is_blue_green_red_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let maps = dir.path().join("colourmaps");
        std::fs::create_dir(&maps).unwrap();
        std::fs::write(maps.join("g1.txt"), "10 20 30\n0 0 0\n").unwrap();

        let palette = Palette::load(dir.path(), ColourScheme::Greyscale).unwrap();
        assert_eq!(palette.continuous(0.0), Rgb::new(30, 20, 10));
    }

    #[test]
    fn malformed_palette_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let maps = dir.path().join("colourmaps");
        std::fs::create_dir(&maps).unwrap();
        std::fs::write(maps.join("g1.txt"), "10 20\n").unwrap();
        assert!(Palette::load(dir.path(), ColourScheme::Greyscale).is_err());
    }
}
