//CSV input/output: forcing time functions, channel property tables,
//layer stack tables, and sampled series output.

extern crate csv;

use std::fs;
use std::path::Path;

use crate::forcing::TimeFunction;

#[derive(Debug)]
pub enum CsvError {
    OpenFileError(String),
    ReadError(String),
    WriteError(String),
}

impl From<CsvError> for String {
    fn from(error: CsvError) -> Self {
        match error {
            CsvError::OpenFileError(msg) => format!("Failed to open file: {}", msg),
            CsvError::ReadError(msg) => format!("Read error: {}", msg),
            CsvError::WriteError(msg) => format!("Write error: {}", msg),
        }
    }
}

//Read one or more forcing time functions from a CSV file. The first
//column is time in hours (converted to seconds here); each remaining
//column becomes one function named after its header.
pub fn read_time_functions(filename: &str) -> Result<Vec<TimeFunction>, CsvError> {
    let mut reader = csv::Reader::from_path(filename)
        .map_err(|_| CsvError::OpenFileError(filename.to_string()))?;

    let mut names: Vec<String> = vec![];
    match reader.headers() {
        Ok(headers) => {
            for i in 1..headers.len() {
                names.push(headers.get(i).unwrap_or("").to_string());
            }
        }
        Err(_) => {
            return Err(CsvError::ReadError(format!("Error reading '{}' header line.", filename)));
        }
    }

    let mut times: Vec<f64> = vec![];
    let mut columns: Vec<Vec<f64>> = vec![vec![]; names.len()];

    let mut file_line = 1;
    for result in reader.records() {
        file_line += 1;
        let record = result.map_err(|_| {
            CsvError::ReadError(format!("Error reading '{}' line {}.", filename, file_line))
        })?;

        let t_hours: f64 = record
            .get(0)
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|_| {
                CsvError::ReadError(format!("Bad time value in '{}' line {}.", filename, file_line))
            })?;
        times.push(t_hours * 3600.0);

        for i in 0..names.len() {
            let value: f64 = record
                .get(i + 1)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| {
                    CsvError::ReadError(format!(
                        "Bad value in '{}' line {} column {}.",
                        filename,
                        file_line,
                        i + 2
                    ))
                })?;
            columns[i].push(value);
        }
    }

    let mut functions = vec![];
    for (i, name) in names.iter().enumerate() {
        let function = TimeFunction::new(name, times.clone(), columns[i].clone())
            .map_err(CsvError::ReadError)?;
        functions.push(function);
    }
    Ok(functions)
}

//Write sampled series as CSV with a leading time column (seconds).
pub fn write_series(
    filename: &str,
    times: &[f64],
    names: &[String],
    columns: &[Vec<f64>],
) -> Result<(), CsvError> {
    for column in columns {
        if column.len() != times.len() {
            return Err(CsvError::WriteError(
                "Cannot write series with mismatched lengths.".to_string(),
            ));
        }
    }

    let mut data_string = String::new();
    data_string.push_str("time_s");
    for name in names {
        data_string.push(',');
        data_string.push_str(name);
    }
    data_string.push_str("\r\n");

    for i in 0..times.len() {
        data_string.push_str(&format!("{}", times[i]));
        for column in columns {
            data_string.push_str(&format!(",{}", column[i]));
        }
        data_string.push_str("\r\n");
    }

    fs::write(Path::new(filename), data_string)
        .map_err(|_| CsvError::WriteError(format!("Error writing file {}.", filename)))
}

//One row of the channel node property table.
#[derive(Debug)]
#[derive(Clone)]
pub struct ChannelNodeRecord {
    pub link: usize,
    pub node: usize,
    pub row: usize,
    pub col: usize,
    pub bottom_width: f64,
    pub bank_height: f64,
    pub side_slope: f64,
    pub n_manning: f64,
    pub sinuosity: f64,
    pub dead_storage: f64,
    pub erodibility: f64,
    pub m_exponent: f64,
    pub transloss_rate: f64,
}

//Read the channel node property table. Expected header:
//link,node,row,col,bottom_width,bank_height,side_slope,n_manning,
//sinuosity,dead_storage,erodibility,m_exponent,transloss_rate
pub fn read_channel_table(filename: &str) -> Result<Vec<ChannelNodeRecord>, CsvError> {
    let mut reader = csv::Reader::from_path(filename)
        .map_err(|_| CsvError::OpenFileError(filename.to_string()))?;

    let mut records = vec![];
    let mut file_line = 1;
    for result in reader.records() {
        file_line += 1;
        let record = result.map_err(|_| {
            CsvError::ReadError(format!("Error reading '{}' line {}.", filename, file_line))
        })?;

        let field = |i: usize| -> Result<f64, CsvError> {
            record
                .get(i)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| {
                    CsvError::ReadError(format!(
                        "Bad value in '{}' line {} column {}.",
                        filename,
                        file_line,
                        i + 1
                    ))
                })
        };

        records.push(ChannelNodeRecord {
            link: field(0)? as usize,
            node: field(1)? as usize,
            row: field(2)? as usize,
            col: field(3)? as usize,
            bottom_width: field(4)?,
            bank_height: field(5)?,
            side_slope: field(6)?,
            n_manning: field(7)?,
            sinuosity: field(8)?,
            dead_storage: field(9)?,
            erodibility: field(10)?,
            m_exponent: field(11)?,
            transloss_rate: field(12)?,
        });
    }
    Ok(records)
}

//One row of the link boundary table: link, outlet index (-1 when the
//link does not drain to the boundary), and the outlet bed slope.
#[derive(Debug)]
#[derive(Clone)]
pub struct LinkRecord {
    pub link: usize,
    pub outlet: i64,
    pub bed_slope_out: f64,
}

pub fn read_link_table(filename: &str) -> Result<Vec<LinkRecord>, CsvError> {
    let mut reader = csv::Reader::from_path(filename)
        .map_err(|_| CsvError::OpenFileError(filename.to_string()))?;

    let mut records = vec![];
    let mut file_line = 1;
    for result in reader.records() {
        file_line += 1;
        let record = result.map_err(|_| {
            CsvError::ReadError(format!("Error reading '{}' line {}.", filename, file_line))
        })?;

        let field = |i: usize| -> Result<f64, CsvError> {
            record
                .get(i)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| {
                    CsvError::ReadError(format!(
                        "Bad value in '{}' line {} column {}.",
                        filename,
                        file_line,
                        i + 1
                    ))
                })
        };

        records.push(LinkRecord {
            link: field(0)? as usize,
            outlet: field(1)? as i64,
            bed_slope_out: field(2)?,
        });
    }
    Ok(records)
}

//One row of the layer stack table. Kind is "ov" for a soil stack at a
//cell (i = row, j = col) or "ch" for a sediment stack at a node
//(i = link, j = node). Layers are listed bottom-up per location.
#[derive(Debug)]
#[derive(Clone)]
pub struct StackRecord {
    pub kind: String,
    pub i: usize,
    pub j: usize,
    pub layer: usize,
    pub volume: f64,
    pub porosity: f64,
    pub vmin: f64,
    pub vmax: f64,
    pub concentrations: Vec<f64>,
}

//Expected header: kind,i,j,layer,volume,porosity,vmin,vmax,conc1,...
pub fn read_stack_table(filename: &str, nsolids: usize) -> Result<Vec<StackRecord>, CsvError> {
    let mut reader = csv::Reader::from_path(filename)
        .map_err(|_| CsvError::OpenFileError(filename.to_string()))?;

    let mut records = vec![];
    let mut file_line = 1;
    for result in reader.records() {
        file_line += 1;
        let record = result.map_err(|_| {
            CsvError::ReadError(format!("Error reading '{}' line {}.", filename, file_line))
        })?;

        let field = |i: usize| -> Result<f64, CsvError> {
            record
                .get(i)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| {
                    CsvError::ReadError(format!(
                        "Bad value in '{}' line {} column {}.",
                        filename,
                        file_line,
                        i + 1
                    ))
                })
        };

        let mut concentrations = vec![];
        for s in 0..nsolids {
            concentrations.push(field(8 + s)?);
        }

        records.push(StackRecord {
            kind: record.get(0).unwrap_or("").trim().to_string(),
            i: field(1)? as usize,
            j: field(2)? as usize,
            layer: field(3)? as usize,
            volume: field(4)?,
            porosity: field(5)?,
            vmin: field(6)?,
            vmax: field(7)?,
            concentrations,
        });
    }
    Ok(records)
}

//Write the channel final-state table: one row per node with the final
//depth and the cumulative boundary volumes of its link.
pub fn write_channel_final_table(
    filename: &str,
    network: &crate::network::ChannelNetwork,
    state: &crate::state::State,
) -> Result<(), CsvError> {
    let mut data_string = String::new();
    data_string.push_str(
        "link,node,row,col,final_depth_m,link_outflow_vol_m3,link_inflow_vol_m3,transloss_vol_m3\r\n",
    );

    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            data_string.push_str(&format!(
                "{},{},{},{},{},{},{},{}\r\n",
                l,
                j,
                node.row,
                node.col,
                state.h_ch[l][j],
                state.q_out_link_vol[l],
                state.q_in_link_vol[l],
                state.transloss_vol[l][j],
            ));
        }
    }

    fs::write(Path::new(filename), data_string)
        .map_err(|_| CsvError::WriteError(format!("Error writing file {}.", filename)))
}
