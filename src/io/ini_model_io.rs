//INI model file reader.
//
//A model definition is a single INI file naming the simulation window,
//the rasters, the channel tables, the solids classes, the process
//options, the forcing files and the reporting stations. Relative paths
//are resolved against the directory containing the model file.
//
//Section overview:
//
//  [simulation]  dt, n_steps, report_interval
//  [grid]        mask, elevation, plus per-cell properties as grids or
//                constants, optional initial water and layer stacks
//  [channels]    enabled, nodes (CSV), links (CSV), initial_depth
//  [solids]      count
//  [solid.N]     per-class parameters
//  [options]     process selectors, scale factors, dispersion coeffs
//  [outlets]     count
//  [outlet.N]    row, col, bc, bed_slope, bed_slope_ov, depth_file
//  [forcing]     rain, snow, qwov, qwch, swov, swch, cbc
//                (location/file lists separated by '|')
//  [reports]     stations

use std::collections::HashMap;
use std::path::PathBuf;

use crate::forcing::{CellSource, Forcing, NodeSource, SolidsLoad};
use crate::grid::{CellType, Grid};
use crate::io::csv_io;
use crate::io::grid_io::read_ascii_grid;
use crate::network::{ChannelNetwork, ChannelNode, Link, Outlet};
use crate::options::ProcessOptions;
use crate::reporting::{Reporter, Station, StationKind};
use crate::simulation::Simulation;
use crate::solids::SolidsClass;
use crate::state::State;

type IniMap = HashMap<String, HashMap<String, Option<String>>>;

#[derive(Default)]
pub struct IniModelIO {
    pub name: String,
}

impl IniModelIO {
    pub fn new() -> IniModelIO {
        IniModelIO {
            ..Default::default()
        }
    }

    /// Reads a complete simulation from an INI model file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the model file.
    ///
    /// # Returns
    ///
    /// * `Ok(Simulation)` - Parsed and validated simulation ready to run
    /// * `Err(String)` - Description of the parsing or validation failure
    pub fn read_model_file(&self, path: &str) -> Result<Simulation, String> {
        let map = ini!(safe path);
        let map: IniMap = map.map_err(|e| format!("Failed to parse model file '{}': {}", path, e))?;

        //Resolve relative paths against the model file directory
        let model_dir = std::path::Path::new(path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let resolve = |file: &str| -> String {
            let p = std::path::Path::new(file);
            if p.is_absolute() {
                file.to_string()
            } else {
                model_dir.join(p).to_string_lossy().to_string()
            }
        };

        //=== [simulation] ===
        let dt = require_f64(&map, "simulation", "dt")?;
        let n_steps = require_f64(&map, "simulation", "n_steps")? as usize;
        let report_interval = get_f64(&map, "simulation", "report_interval", dt)?;

        //=== [grid] ===
        let mask_file = require_string(&map, "grid", "mask")?;
        let mask_grid = read_ascii_grid(&resolve(&mask_file))?;
        let elevation_file = require_string(&map, "grid", "elevation")?;
        let elevation_grid = read_ascii_grid(&resolve(&elevation_file))?;

        let (nrows, ncols) = (mask_grid.nrows, mask_grid.ncols);
        let mut grid = Grid::new(nrows, ncols, mask_grid.cellsize);
        for row in 0..nrows {
            for col in 0..ncols {
                if mask_grid.is_nodata(row, col) || mask_grid.values[row][col] <= 0.0 {
                    continue;
                }
                grid.mask[row][col] = CellType::Overland;
                grid.elevation[row][col] = elevation_grid.values[row][col];
            }
        }

        //Per-cell properties given as a grid file or a constant
        load_cell_property(&map, "grid", "manning", 0.03, &mut grid.n_manning, &resolve)?;
        load_cell_property(&map, "grid", "storage_depth", 0.0, &mut grid.storage_depth, &resolve)?;
        load_cell_property(&map, "grid", "erodibility", 0.0, &mut grid.erodibility, &resolve)?;
        load_cell_property(&map, "grid", "m_exponent", 1.0, &mut grid.m_exponent, &resolve)?;
        load_cell_property(&map, "grid", "kusle", 0.0, &mut grid.kusle, &resolve)?;
        load_cell_property(&map, "grid", "cusle", 0.0, &mut grid.cusle, &resolve)?;
        load_cell_property(&map, "grid", "pusle", 0.0, &mut grid.pusle, &resolve)?;

        if let Some(file) = get_string(&map, "grid", "land_use") {
            let land_use_grid = read_ascii_grid(&resolve(&file))?;
            for row in 0..nrows {
                for col in 0..ncols {
                    if !land_use_grid.is_nodata(row, col) {
                        grid.land_use[row][col] = land_use_grid.values[row][col] as i32;
                    }
                }
            }
        }

        //=== [solids] and [solid.N] ===
        let nsolids = get_f64(&map, "solids", "count", 1.0)? as usize;
        let mut solids = vec![];
        for s in 1..=nsolids {
            let section = format!("solid.{}", s);
            let mut class = SolidsClass::new(
                &get_string(&map, &section, "name").unwrap_or_else(|| format!("solid{}", s)),
            );
            class.spgravity = get_f64(&map, &section, "spgravity", class.spgravity)?;
            class.diameter = get_f64(&map, &section, "diameter", class.diameter)?;
            class.ws = get_f64(&map, &section, "ws", class.ws)?;
            class.tau_ce = get_f64(&map, &section, "tau_ce", class.tau_ce)?;
            class.tau_cd = get_f64(&map, &section, "tau_cd", class.tau_cd)?;
            class.zage = get_f64(&map, &section, "zage", class.zage)?;
            class.cncopt = get_f64(&map, &section, "cohesive", 0.0)? as i32;
            solids.push(class);
        }

        //=== [options] ===
        let mut options = ProcessOptions::new();
        options.chnopt = get_f64(&map, "options", "chnopt", options.chnopt as f64)? as i32;
        options.fldopt = get_f64(&map, "options", "fldopt", options.fldopt as f64)? as i32;
        options.ctlopt = get_f64(&map, "options", "ctlopt", options.ctlopt as f64)? as i32;
        options.snowopt = get_f64(&map, "options", "snowopt", options.snowopt as f64)? as i32;
        options.meltopt = get_f64(&map, "options", "meltopt", options.meltopt as f64)? as i32;
        options.advovopt = get_f64(&map, "options", "advovopt", options.advovopt as f64)? as i32;
        options.dspovopt = get_f64(&map, "options", "dspovopt", options.dspovopt as f64)? as i32;
        options.depovopt = get_f64(&map, "options", "depovopt", options.depovopt as f64)? as i32;
        options.ersovopt = get_f64(&map, "options", "ersovopt", options.ersovopt as f64)? as i32;
        options.advchopt = get_f64(&map, "options", "advchopt", options.advchopt as f64)? as i32;
        options.dspchopt = get_f64(&map, "options", "dspchopt", options.dspchopt as f64)? as i32;
        options.depchopt = get_f64(&map, "options", "depchopt", options.depchopt as f64)? as i32;
        options.erschopt = get_f64(&map, "options", "erschopt", options.erschopt as f64)? as i32;
        options.advovscale = get_f64(&map, "options", "advovscale", options.advovscale)?;
        options.advchscale = get_f64(&map, "options", "advchscale", options.advchscale)?;
        options.depovscale = get_f64(&map, "options", "depovscale", options.depovscale)?;
        options.depchscale = get_f64(&map, "options", "depchscale", options.depchscale)?;
        options.ersovscale = get_f64(&map, "options", "ersovscale", options.ersovscale)?;
        options.erschscale = get_f64(&map, "options", "erschscale", options.erschscale)?;
        options.dspovcoeff = get_f64(&map, "options", "dspovcoeff", options.dspovcoeff)?;
        options.dspchcoeff = get_f64(&map, "options", "dspchcoeff", options.dspchcoeff)?;
        options.nstack_max = get_f64(&map, "options", "nstack_max", options.nstack_max as f64)? as usize;

        //=== [outlets] and [outlet.N] ===
        let mut forcing = Forcing::new();
        let noutlets = get_f64(&map, "outlets", "count", 0.0)? as usize;
        let mut outlets = vec![];
        for k in 1..=noutlets {
            let section = format!("outlet.{}", k);
            let row = require_f64(&map, &section, "row")? as usize;
            let col = require_f64(&map, &section, "col")? as usize;
            let bc_opt = get_f64(&map, &section, "bc", 0.0)? as i32;
            let hbc_function = match get_string(&map, &section, "depth_file") {
                Some(file) => {
                    let functions =
                        csv_io::read_time_functions(&resolve(&file)).map_err(String::from)?;
                    let function = functions
                        .into_iter()
                        .next()
                        .ok_or_else(|| format!("depth file '{}' has no data column", file))?;
                    Some(forcing.add_function(function))
                }
                None => None,
            };
            outlets.push(Outlet {
                row,
                col,
                bc_opt,
                hbc_function,
                bed_slope_ov: get_f64(&map, &section, "bed_slope_ov", 0.0)?,
            });
        }

        //=== [channels] ===
        let mut network = ChannelNetwork::new();
        network.outlets = outlets;
        let channels_enabled = get_f64(&map, "channels", "enabled", 0.0)? as i32;
        if channels_enabled > 0 {
            let nodes_file = require_string(&map, "channels", "nodes")?;
            let node_records =
                csv_io::read_channel_table(&resolve(&nodes_file)).map_err(String::from)?;

            let nlinks = node_records.iter().map(|r| r.link + 1).max().unwrap_or(0);
            network.links = vec![Link::new(); nlinks];
            let mut ordered = node_records.clone();
            ordered.sort_by_key(|r| (r.link, r.node));
            for record in ordered.iter() {
                let link = &mut network.links[record.link];
                if record.node != link.nodes.len() {
                    return Err(format!(
                        "channel table '{}' has non-contiguous node numbers in link {}",
                        nodes_file, record.link
                    ));
                }
                let mut node = ChannelNode::new(record.row, record.col);
                node.bottom_width = record.bottom_width;
                node.bank_height = record.bank_height;
                node.side_slope = record.side_slope;
                node.n_manning = record.n_manning;
                node.length = grid.cell_size * record.sinuosity;
                node.dead_storage = record.dead_storage;
                node.erodibility = record.erodibility;
                node.m_exponent = record.m_exponent;
                node.transloss_rate = record.transloss_rate;
                //the channel bed sits one bank height below the ground
                node.bed_elevation = grid.elevation[record.row][record.col] - record.bank_height;
                link.nodes.push(node);
            }

            let links_file = require_string(&map, "channels", "links")?;
            let link_records =
                csv_io::read_link_table(&resolve(&links_file)).map_err(String::from)?;
            for record in link_records.iter() {
                if record.link >= network.links.len() {
                    return Err(format!("link table '{}' names unknown link {}", links_file, record.link));
                }
                network.links[record.link].bed_slope_out = record.bed_slope_out;
                if record.outlet >= 0 {
                    network.links[record.link].outlet = Some(record.outlet as usize);
                }
            }
        }

        //=== [forcing] ===
        if let Some(file) = get_string(&map, "forcing", "rain") {
            let functions = csv_io::read_time_functions(&resolve(&file)).map_err(String::from)?;
            let function = functions
                .into_iter()
                .next()
                .ok_or_else(|| format!("rain file '{}' has no data column", file))?;
            forcing.rain = Some(forcing.add_function(function));
        }
        if let Some(file) = get_string(&map, "forcing", "snow") {
            let functions = csv_io::read_time_functions(&resolve(&file)).map_err(String::from)?;
            let function = functions
                .into_iter()
                .next()
                .ok_or_else(|| format!("snow file '{}' has no data column", file))?;
            forcing.snow = Some(forcing.add_function(function));
        }

        //Point flows and loads: semicolon-separated location/file lists
        if let Some(list) = get_string(&map, "forcing", "qwov") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 3, "qwov")?;
                let function = load_single_function(&mut forcing, &resolve(&parts[2]))?;
                forcing.qwov.push(CellSource {
                    row: parse_usize(&parts[0], "qwov row")?,
                    col: parse_usize(&parts[1], "qwov col")?,
                    function,
                });
            }
        }
        if let Some(list) = get_string(&map, "forcing", "qwch") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 3, "qwch")?;
                let function = load_single_function(&mut forcing, &resolve(&parts[2]))?;
                forcing.qwch.push(NodeSource {
                    link: parse_usize(&parts[0], "qwch link")?,
                    node: parse_usize(&parts[1], "qwch node")?,
                    function,
                });
            }
        }
        if let Some(list) = get_string(&map, "forcing", "swov") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 4, "swov")?;
                let function = load_single_function(&mut forcing, &resolve(&parts[3]))?;
                forcing.swov.push(SolidsLoad {
                    solid: parse_usize(&parts[0], "swov solid")?,
                    row_or_link: parse_usize(&parts[1], "swov row")?,
                    col_or_node: parse_usize(&parts[2], "swov col")?,
                    function,
                });
            }
        }
        if let Some(list) = get_string(&map, "forcing", "swch") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 4, "swch")?;
                let function = load_single_function(&mut forcing, &resolve(&parts[3]))?;
                forcing.swch.push(SolidsLoad {
                    solid: parse_usize(&parts[0], "swch solid")?,
                    row_or_link: parse_usize(&parts[1], "swch link")?,
                    col_or_node: parse_usize(&parts[2], "swch node")?,
                    function,
                });
            }
        }
        forcing.cbc = vec![vec![None; nsolids]; network.outlets.len()];
        if let Some(list) = get_string(&map, "forcing", "cbc") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 3, "cbc")?;
                let outlet = parse_usize(&parts[0], "cbc outlet")?;
                let solid = parse_usize(&parts[1], "cbc solid")?;
                let function = load_single_function(&mut forcing, &resolve(&parts[2]))?;
                if outlet >= network.outlets.len() || solid >= nsolids {
                    return Err("cbc entry names an unknown outlet or solids class".to_string());
                }
                forcing.cbc[outlet][solid] = Some(function);
            }
        }

        //=== [reports] ===
        let mut stations = vec![];
        if let Some(list) = get_string(&map, "reports", "stations") {
            for item in split_list(&list) {
                let parts = item_fields(&item, 4, "stations")?;
                let kind = match parts[3].as_str() {
                    "flow" => StationKind::Flow,
                    "conc" => StationKind::Concentration,
                    other => return Err(format!("unknown station kind '{}'", other)),
                };
                stations.push(Station {
                    name: parts[0].clone(),
                    row: parse_usize(&parts[1], "station row")?,
                    col: parse_usize(&parts[2], "station col")?,
                    kind,
                });
            }
        }
        let reporter = Reporter::new(stations, report_interval, nsolids);

        //=== assemble ===
        let stack_file = get_string(&map, "grid", "stacks").map(|f| resolve(&f));
        let initial_water_file = get_string(&map, "grid", "initial_water").map(|f| resolve(&f));
        let initial_depth_ch = get_f64(&map, "channels", "initial_depth", 0.0)?;

        let mut sim = Simulation::new(grid, network, solids, options, forcing, reporter, dt, n_steps)
            .map_err(String::from)?;

        //Initial water depths
        if let Some(file) = initial_water_file {
            let initial_grid = read_ascii_grid(&file)?;
            for row in 0..sim.grid.nrows {
                for col in 0..sim.grid.ncols {
                    if sim.grid.is_active(row, col) && !initial_grid.is_nodata(row, col) {
                        sim.state.h_ov[row][col] = initial_grid.values[row][col];
                    }
                }
            }
        }
        if initial_depth_ch > 0.0 {
            for l in 0..sim.network.n_links() {
                for j in 0..sim.network.links[l].n_nodes() {
                    sim.state.h_ch[l][j] = initial_depth_ch;
                }
            }
        }

        //Layer stacks
        if let Some(file) = stack_file {
            let records = csv_io::read_stack_table(&file, nsolids).map_err(String::from)?;
            apply_stack_records(&mut sim.state, &records)?;
        }

        Ok(sim)
    }
}

//Group stack records by location and install them in order.
fn apply_stack_records(state: &mut State, records: &[csv_io::StackRecord]) -> Result<(), String> {
    let mut grouped: HashMap<(String, usize, usize), Vec<&csv_io::StackRecord>> = HashMap::new();
    for record in records {
        grouped
            .entry((record.kind.clone(), record.i, record.j))
            .or_insert_with(Vec::new)
            .push(record);
    }

    for ((kind, i, j), mut layers) in grouped {
        layers.sort_by_key(|r| r.layer);
        let volumes: Vec<f64> = layers.iter().map(|r| r.volume).collect();
        let porosities: Vec<f64> = layers.iter().map(|r| r.porosity).collect();
        let vmin = layers.last().unwrap().vmin;
        let vmax = layers.last().unwrap().vmax;
        let mut concentrations = vec![vec![]; state.nsolids];
        for s in 0..state.nsolids {
            for layer in layers.iter() {
                concentrations[s].push(layer.concentrations[s]);
            }
        }

        match kind.as_str() {
            "ov" => {
                let bed_area = state.abed_ov[i][j].first().copied().unwrap_or(0.0);
                state.set_soil_stack(i, j, volumes, porosities, bed_area, vmin, vmax, concentrations);
            }
            "ch" => {
                let bed_area = state.abed_ch[i][j].first().copied().unwrap_or(0.0);
                state.set_sediment_stack(i, j, volumes, porosities, bed_area, vmin, vmax, concentrations);
            }
            other => return Err(format!("unknown stack kind '{}'", other)),
        }
    }
    Ok(())
}

//=== small INI access helpers ===

fn get_string(map: &IniMap, section: &str, key: &str) -> Option<String> {
    map.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.clone())
}

fn require_string(map: &IniMap, section: &str, key: &str) -> Result<String, String> {
    get_string(map, section, key)
        .ok_or_else(|| format!("model file is missing [{}] {}", section, key))
}

fn get_f64(map: &IniMap, section: &str, key: &str, default: f64) -> Result<f64, String> {
    match get_string(map, section, key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| format!("[{}] {} is not numeric: '{}'", section, key, value)),
        None => Ok(default),
    }
}

fn require_f64(map: &IniMap, section: &str, key: &str) -> Result<f64, String> {
    let value = require_string(map, section, key)?;
    value
        .trim()
        .parse()
        .map_err(|_| format!("[{}] {} is not numeric: '{}'", section, key, value))
}

fn parse_usize(value: &str, what: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{} is not a valid index: '{}'", what, value))
}

//List values use '|' between entries ( ';' would read as an INI comment)
fn split_list(list: &str) -> Vec<String> {
    list.split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn item_fields(item: &str, expected: usize, what: &str) -> Result<Vec<String>, String> {
    let parts: Vec<String> = item.split(',').map(|s| s.trim().to_string()).collect();
    if parts.len() != expected {
        return Err(format!("{} entry '{}' needs {} comma-separated fields", what, item, expected));
    }
    Ok(parts)
}

fn load_single_function(forcing: &mut Forcing, path: &str) -> Result<usize, String> {
    let functions = csv_io::read_time_functions(path).map_err(String::from)?;
    let function = functions
        .into_iter()
        .next()
        .ok_or_else(|| format!("forcing file '{}' has no data column", path))?;
    Ok(forcing.add_function(function))
}

//Load a per-cell property from a grid file ("<key>_grid") or fill it
//with a constant ("<key>", falling back to the default).
fn load_cell_property(
    map: &IniMap,
    section: &str,
    key: &str,
    default: f64,
    target: &mut Vec<Vec<f64>>,
    resolve: &dyn Fn(&str) -> String,
) -> Result<(), String> {
    let grid_key = format!("{}_grid", key);
    if let Some(file) = get_string(map, section, &grid_key) {
        let ascii = read_ascii_grid(&resolve(&file))?;
        for row in 0..target.len() {
            for col in 0..target[row].len() {
                if row < ascii.nrows && col < ascii.ncols && !ascii.is_nodata(row, col) {
                    target[row][col] = ascii.values[row][col];
                }
            }
        }
        return Ok(());
    }
    let value = get_f64(map, section, key, default)?;
    for row in 0..target.len() {
        for col in 0..target[row].len() {
            target[row][col] = value;
        }
    }
    Ok(())
}
