//ASCII raster input/output.
//
//Rasters use the plain-text header plus row-major values layout
//common to GIS tools:
//
//  ncols         4
//  nrows         3
//  xllcorner     0.0
//  yllcorner     0.0
//  cellsize      10.0
//  NODATA_value  -9999
//  <nrows lines of ncols whitespace-separated values>

use std::fs;
use std::path::Path;

#[derive(Debug)]
#[derive(Clone)]
pub struct AsciiGrid {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata: f64,
    pub values: Vec<Vec<f64>>,
}

impl AsciiGrid {
    pub fn new(nrows: usize, ncols: usize, cellsize: f64, nodata: f64) -> AsciiGrid {
        AsciiGrid {
            ncols,
            nrows,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize,
            nodata,
            values: vec![vec![nodata; ncols]; nrows],
        }
    }

    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.values[row][col] == self.nodata
    }
}

pub fn read_ascii_grid(filename: &str) -> Result<AsciiGrid, String> {
    let content = fs::read_to_string(filename)
        .map_err(|e| format!("Failed to read grid file '{}': {}", filename, e))?;

    let mut lines = content.lines();
    let mut header = std::collections::HashMap::new();

    //Six header lines of "key value"
    for _ in 0..6 {
        let line = lines
            .next()
            .ok_or_else(|| format!("Grid file '{}' has a truncated header", filename))?;
        let mut parts = line.split_whitespace();
        let key = parts
            .next()
            .ok_or_else(|| format!("Grid file '{}' has a malformed header line", filename))?
            .to_lowercase();
        let value: f64 = parts
            .next()
            .ok_or_else(|| format!("Grid file '{}' header key '{}' has no value", filename, key))?
            .parse()
            .map_err(|_| format!("Grid file '{}' header key '{}' is not numeric", filename, key))?;
        header.insert(key, value);
    }

    let get = |key: &str| -> Result<f64, String> {
        header
            .get(key)
            .copied()
            .ok_or_else(|| format!("Grid file '{}' is missing header key '{}'", filename, key))
    };

    let ncols = get("ncols")? as usize;
    let nrows = get("nrows")? as usize;
    let mut grid = AsciiGrid {
        ncols,
        nrows,
        xllcorner: get("xllcorner")?,
        yllcorner: get("yllcorner")?,
        cellsize: get("cellsize")?,
        nodata: get("nodata_value")?,
        values: Vec::with_capacity(nrows),
    };

    //Row-major values, one raster row per line (extra line breaks are
    //tolerated by pooling all remaining tokens)
    let mut tokens = lines.flat_map(|line| line.split_whitespace());
    for row in 0..nrows {
        let mut values = Vec::with_capacity(ncols);
        for col in 0..ncols {
            let token = tokens.next().ok_or_else(|| {
                format!("Grid file '{}' ran out of values at row {} col {}", filename, row, col)
            })?;
            let value: f64 = token.parse().map_err(|_| {
                format!("Grid file '{}' has a non-numeric value at row {} col {}", filename, row, col)
            })?;
            values.push(value);
        }
        grid.values.push(values);
    }

    Ok(grid)
}

pub fn write_ascii_grid(filename: &str, grid: &AsciiGrid) -> Result<(), String> {
    let mut content = String::new();
    content.push_str(&format!("ncols         {}\r\n", grid.ncols));
    content.push_str(&format!("nrows         {}\r\n", grid.nrows));
    content.push_str(&format!("xllcorner     {}\r\n", grid.xllcorner));
    content.push_str(&format!("yllcorner     {}\r\n", grid.yllcorner));
    content.push_str(&format!("cellsize      {}\r\n", grid.cellsize));
    content.push_str(&format!("NODATA_value  {}\r\n", grid.nodata));

    for row in 0..grid.nrows {
        let mut line = String::new();
        for col in 0..grid.ncols {
            if col > 0 {
                line.push(' ');
            }
            line.push_str(&format!("{}", grid.values[row][col]));
        }
        content.push_str(&line);
        content.push_str("\r\n");
    }

    fs::write(Path::new(filename), content)
        .map_err(|e| format!("Error writing grid file '{}': {}", filename, e))
}
