//! Grid file I/O
//!
//! Three on-disk formats are supported:
//! - `txt`: rows separated by newlines, values by single spaces
//! - `csv`: the same shape with comma separators
//! - `bin`: two little-endian `i32` header words (height, then width)
//!   followed by the raw cell values packed row-major
//!
//! Width is inferred from the first row of a text file and every row must
//! match it. The vector-per-cell grid supports the text format only, with
//! comma-separated components inside each space-separated cell.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridElement, VectorGrid};

/// On-disk grid format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Txt,
    Csv,
    Bin,
}

impl GridFormat {
    /// Resolve the format from a path's extension.
    pub fn from_extension(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    /// Separator character for the text formats.
    fn separator(self) -> char {
        match self {
            GridFormat::Txt => ' ',
            GridFormat::Csv => ',',
            GridFormat::Bin => unreachable!("binary format has no separator"),
        }
    }
}

impl FromStr for GridFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "txt" => Ok(GridFormat::Txt),
            "csv" => Ok(GridFormat::Csv),
            "bin" => Ok(GridFormat::Bin),
            other => Err(Error::UnknownOption {
                kind: "grid format",
                value: other.to_string(),
            }),
        }
    }
}

impl<T: GridElement> Grid<T> {
    /// Load a grid from `path` in the given format.
    pub fn load_from<P: AsRef<Path>>(path: P, format: GridFormat) -> Result<Self> {
        match format {
            GridFormat::Txt | GridFormat::Csv => load_delimited(path.as_ref(), format.separator()),
            GridFormat::Bin => load_binary(path.as_ref()),
        }
    }

    /// Save the grid to `path` in the given format.
    pub fn save_to<P: AsRef<Path>>(&self, path: P, format: GridFormat) -> Result<()> {
        match format {
            GridFormat::Txt | GridFormat::Csv => {
                save_delimited(self, path.as_ref(), format.separator())
            }
            GridFormat::Bin => save_binary(self, path.as_ref()),
        }
    }
}

fn load_delimited<T: GridElement>(path: &Path, separator: char) -> Result<Grid<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows: Vec<Vec<T>> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split(separator) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let value = token.parse::<T>().map_err(|_| Error::Parse {
                value: token.to_string(),
                line: index + 1,
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    for (index, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::RaggedRow {
                row: index,
                expected: width,
                got: row.len(),
            });
        }
    }

    Grid::from_vec(rows.into_iter().flatten().collect(), width, height)
}

fn save_delimited<T: GridElement>(grid: &Grid<T>, path: &Path, separator: char) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if x > 0 {
                write!(out, "{separator}")?;
            }
            write!(out, "{}", grid.get(x, y))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn load_binary<T: GridElement>(path: &Path) -> Result<Grid<T>> {
    let mut file = BufReader::new(File::open(path)?);

    let mut word = [0u8; 4];
    file.read_exact(&mut word)?;
    let height = i32::from_le_bytes(word);
    file.read_exact(&mut word)?;
    let width = i32::from_le_bytes(word);

    if height <= 0 || width <= 0 {
        return Err(Error::InvalidDimensions {
            width: width.max(0) as usize,
            height: height.max(0) as usize,
        });
    }
    let (width, height) = (width as usize, height as usize);

    let mut data = vec![T::zero(); width * height];
    file.read_exact(bytemuck::cast_slice_mut(&mut data))?;

    Grid::from_vec(data, width, height)
}

fn save_binary<T: GridElement>(grid: &Grid<T>, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&(grid.height() as i32).to_le_bytes())?;
    out.write_all(&(grid.width() as i32).to_le_bytes())?;
    for value in grid.values() {
        out.write_all(bytemuck::bytes_of(&value))?;
    }
    out.flush()?;
    Ok(())
}

impl<T: GridElement> VectorGrid<T> {
    /// Load a vector grid from a text file.
    pub fn load_from<P: AsRef<Path>>(path: P, format: GridFormat) -> Result<Self> {
        if format != GridFormat::Txt {
            return Err(Error::UnknownOption {
                kind: "vector grid format",
                value: format!("{format:?}").to_lowercase(),
            });
        }

        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut rows: Vec<Vec<Vec<T>>> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for cell in line.split(' ') {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let mut components = Vec::new();
                for token in cell.split(',') {
                    let value = token.parse::<T>().map_err(|_| Error::Parse {
                        value: token.to_string(),
                        line: index + 1,
                    })?;
                    components.push(value);
                }
                row.push(components);
            }
            rows.push(row);
        }

        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::RaggedRow {
                    row: index,
                    expected: width,
                    got: row.len(),
                });
            }
        }

        VectorGrid::from_vec(rows.into_iter().flatten().collect(), width, height)
    }

    /// Save the vector grid to a text file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P, format: GridFormat) -> Result<()> {
        if format != GridFormat::Txt {
            return Err(Error::UnknownOption {
                kind: "vector grid format",
                value: format!("{format:?}").to_lowercase(),
            });
        }

        let mut out = BufWriter::new(File::create(path.as_ref())?);
        for y in 0..self.height() {
            for x in 0..self.width() {
                if x > 0 {
                    write!(out, " ")?;
                }
                let components = self.get(x, y);
                for (i, value) in components.iter().enumerate() {
                    if i > 0 {
                        write!(out, ",")?;
                    }
                    write!(out, "{value}")?;
                }
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}
