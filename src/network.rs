//Channel network model: links, nodes, junction topology and outlets.
//
//A link is a contiguous chain of trapezoidal channel nodes laid over
//raster cells. Links join at junctions where the last node of one link
//is raster-adjacent to the first node of another; a junction with no
//downstream link is a domain boundary (outlet). All cross-references
//are dense indices; there are no pointer graphs.

use crate::errors::{ErrorKind, SimulationError};
use crate::grid::{CellType, Grid};

//Outlet boundary condition selector values
pub const BC_NORMAL_DEPTH: i32 = 0;
pub const BC_SPECIFIED_DEPTH: i32 = 1;

#[derive(Debug)]
#[derive(Clone)]
pub struct ChannelNode {
    pub row: usize,
    pub col: usize,
    pub bottom_width: f64,      //bw (m)
    pub bank_height: f64,       //hbank (m)
    pub side_slope: f64,        //z (horizontal run per unit rise)
    pub n_manning: f64,
    pub length: f64,            //channel length through the cell, incl. sinuosity (m)
    pub dead_storage: f64,      //depth below which no flow is generated (m)
    pub bed_elevation: f64,     //z of the channel bed (m)
    pub erodibility: f64,       //excess-shear multiplier ay (g/m2)
    pub m_exponent: f64,        //excess-shear exponent
    pub transloss_rate: f64,    //transmission loss rate (m/s)

    //channel neighbour by flow direction (1..=8), filled by derive_topology
    pub neighbour: [Option<(usize, usize)>; 9],
}

impl ChannelNode {
    pub fn new(row: usize, col: usize) -> ChannelNode {
        ChannelNode {
            row,
            col,
            bottom_width: 1.0,
            bank_height: 1.0,
            side_slope: 0.0,
            n_manning: 0.03,
            length: 0.0,
            dead_storage: 0.0,
            bed_elevation: 0.0,
            erodibility: 0.0,
            m_exponent: 1.0,
            transloss_rate: 0.0,
            neighbour: [None; 9],
        }
    }

    //Top width of the section at bank height (m)
    pub fn top_width(&self) -> f64 {
        self.bottom_width + 2.0 * self.side_slope * self.bank_height
    }

    //Water surface area of the channel portion of the host cell (m2)
    pub fn surface_area(&self) -> f64 {
        self.top_width() * self.length
    }

    //Bed surface area (m2)
    pub fn bed_area(&self) -> f64 {
        self.bottom_width * self.length
    }

    //Cross-section area used for stored volume: trapezoid capped at
    //bank height plus a rectangular overbank block of top width (m2).
    pub fn storage_cross_section(&self, h: f64) -> f64 {
        if h <= self.bank_height {
            (self.bottom_width + self.side_slope * h) * h
        } else {
            (self.bottom_width + self.side_slope * self.bank_height) * self.bank_height
                + (h - self.bank_height) * self.top_width()
        }
    }

    //Volume of water stored in the node at depth h (m3)
    pub fn storage_volume(&self, h: f64) -> f64 {
        self.storage_cross_section(h) * self.length
    }

    //Volume the node holds when filled exactly to the top of bank (m3)
    pub fn bank_volume(&self) -> f64 {
        (self.bottom_width + self.side_slope * self.bank_height) * self.bank_height * self.length
    }

    //Conveyance section: flow area and wetted perimeter at depth h with
    //the given dead-storage depth withheld from the flow. Above the bank
    //a rectangular block of top width is added.
    pub fn conveyance_section(&self, h: f64, stordep: f64) -> (f64, f64) {
        let heff = h - stordep;
        let zz = (1.0 + self.side_slope * self.side_slope).sqrt();
        if h <= self.bank_height {
            let area = (self.bottom_width + self.side_slope * heff) * heff;
            let wp = self.bottom_width + 2.0 * heff * zz;
            (area, wp)
        } else {
            let area = (self.bottom_width + self.side_slope * heff) * heff
                + (h - self.bank_height) * self.top_width();
            let wp = self.bottom_width + 2.0 * (self.bank_height - stordep) * zz
                + 2.0 * (h - self.bank_height);
            (area, wp)
        }
    }
}

#[derive(Debug)]
#[derive(Clone)]
pub struct Link {
    pub nodes: Vec<ChannelNode>,

    //downstream links by direction (1..=8); slot 0 holds the count
    pub down_links: [Option<usize>; 9],
    pub n_down: usize,

    //upstream links by direction (1..=8) seen from the first node
    pub up_links: [Option<usize>; 9],

    //outlet served by this link when its last node is a boundary
    pub outlet: Option<usize>,

    //bed slope from the last node to the virtual boundary node
    pub bed_slope_out: f64,
}

impl Link {
    pub fn new() -> Link {
        Link {
            nodes: vec![],
            down_links: [None; 9],
            n_down: 0,
            up_links: [None; 9],
            outlet: None,
            bed_slope_out: 0.0,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn last_node(&self) -> usize {
        self.nodes.len() - 1
    }
}

//A designated watershed boundary cell.
#[derive(Debug)]
#[derive(Clone)]
pub struct Outlet {
    pub row: usize,
    pub col: usize,
    pub bc_opt: i32,                //BC_NORMAL_DEPTH or BC_SPECIFIED_DEPTH
    pub hbc_function: Option<usize>, //forcing index of the specified-depth series
    pub bed_slope_ov: f64,          //overland ground slope out of the domain
}

#[derive(Debug)]
#[derive(Clone)]
pub struct ChannelNetwork {
    pub links: Vec<Link>,
    pub outlets: Vec<Outlet>,
}

impl ChannelNetwork {
    pub fn new() -> ChannelNetwork {
        ChannelNetwork {
            links: vec![],
            outlets: vec![],
        }
    }

    pub fn n_links(&self) -> usize {
        self.links.len()
    }

    //Derive junction topology from raster adjacency of the node cells
    //and validate that the resulting connection tables are mutual.
    //Also stamps link/node ids into the grid.
    pub fn derive_topology(&mut self, grid: &mut Grid) -> Result<(), SimulationError> {
        //Stamp link and node numbers into the host cells
        for l in 0..self.links.len() {
            for j in 0..self.links[l].nodes.len() {
                let row = self.links[l].nodes[j].row;
                let col = self.links[l].nodes[j].col;
                if grid.link_id[row][col] != usize::MAX {
                    return Err(SimulationError::new(
                        ErrorKind::TopologyInconsistency,
                        l,
                        j,
                        0,
                        "two channel nodes occupy the same cell",
                    ));
                }
                grid.link_id[row][col] = l;
                grid.node_id[row][col] = j;
                grid.mask[row][col] = CellType::Channel;
            }
        }

        //Consecutive nodes of a link must be raster-adjacent, and the
        //in-link neighbour tables follow directly from their positions.
        for l in 0..self.links.len() {
            if self.links[l].nodes.is_empty() {
                return Err(SimulationError::new(
                    ErrorKind::TopologyInconsistency,
                    l,
                    0,
                    0,
                    "link has no nodes",
                ));
            }
            for j in 0..self.links[l].nodes.len() - 1 {
                let a = (self.links[l].nodes[j].row, self.links[l].nodes[j].col);
                let b = (self.links[l].nodes[j + 1].row, self.links[l].nodes[j + 1].col);
                let dir = match Grid::direction_between(a.0, a.1, b.0, b.1) {
                    Some(d) => d,
                    None => {
                        return Err(SimulationError::new(
                            ErrorKind::TopologyInconsistency,
                            l,
                            j,
                            0,
                            "consecutive nodes of a link are not adjacent",
                        ));
                    }
                };
                self.links[l].nodes[j].neighbour[dir] = Some((l, j + 1));
                self.links[l].nodes[j + 1].neighbour[Grid::opposite(dir)] = Some((l, j));
            }
        }

        //Junctions: the last node of a link connects to the first node
        //of every adjacent link; record branches in both directions.
        for l in 0..self.links.len() {
            let last = self.links[l].last_node();
            let (lrow, lcol) = (self.links[l].nodes[last].row, self.links[l].nodes[last].col);
            for dir in 1..=8usize {
                if let Some((nr, nc)) = neighbour_cell(grid, lrow, lcol, dir) {
                    let m = grid.link_id[nr][nc];
                    if m == usize::MAX || m == l {
                        continue;
                    }
                    //only the first node of another link can be downstream
                    if grid.node_id[nr][nc] != 0 {
                        continue;
                    }
                    self.links[l].down_links[dir] = Some(m);
                    self.links[l].n_down += 1;
                    self.links[l].nodes[last].neighbour[dir] = Some((m, 0));
                    let back = Grid::opposite(dir);
                    self.links[m].up_links[back] = Some(l);
                    self.links[m].nodes[0].neighbour[back] = Some((l, last));
                }
            }
        }

        //Mutuality check: every downstream branch must be seen as an
        //upstream branch from the other side, and vice versa.
        for l in 0..self.links.len() {
            for dir in 1..=8usize {
                if let Some(m) = self.links[l].down_links[dir] {
                    let back = Grid::opposite(dir);
                    if self.links[m].up_links[back] != Some(l) {
                        return Err(SimulationError::new(
                            ErrorKind::TopologyInconsistency,
                            l,
                            m,
                            0,
                            "down/up direction tables are not mutual",
                        ));
                    }
                }
                if let Some(m) = self.links[l].up_links[dir] {
                    let back = Grid::opposite(dir);
                    if self.links[m].down_links[back] != Some(l) {
                        return Err(SimulationError::new(
                            ErrorKind::TopologyInconsistency,
                            l,
                            m,
                            0,
                            "up/down direction tables are not mutual",
                        ));
                    }
                }
            }
        }

        //A link with no downstream branch must drain to an outlet
        for l in 0..self.links.len() {
            if self.links[l].n_down == 0 && self.links[l].outlet.is_none() {
                return Err(SimulationError::new(
                    ErrorKind::TopologyInconsistency,
                    l,
                    self.links[l].last_node(),
                    0,
                    "terminal link has no outlet assigned",
                ));
            }
        }

        Ok(())
    }

    //Validate channel geometry (fatal at init when non-physical).
    pub fn validate(&self) -> Result<(), SimulationError> {
        for l in 0..self.links.len() {
            for j in 0..self.links[l].nodes.len() {
                let node = &self.links[l].nodes[j];
                if node.bottom_width <= 0.0
                    || node.bank_height <= 0.0
                    || node.side_slope < 0.0
                    || node.n_manning <= 0.0
                    || node.length <= 0.0
                    || node.dead_storage < 0.0
                {
                    return Err(SimulationError::new(
                        ErrorKind::ConfigurationError,
                        l,
                        j,
                        0,
                        "non-physical channel geometry",
                    ));
                }
            }
        }
        Ok(())
    }
}

//Raw raster adjacency (ignores the domain mask; a channel cell on the
//domain edge must still see its in-link neighbours).
fn neighbour_cell(grid: &Grid, row: usize, col: usize, dir: usize) -> Option<(usize, usize)> {
    const DROW: [i32; 9] = [0, -1, -1, 0, 1, 1, 1, 0, -1];
    const DCOL: [i32; 9] = [0, 0, 1, 1, 1, 0, -1, -1, -1];
    let nr = row as i32 + DROW[dir];
    let nc = col as i32 + DCOL[dir];
    if nr < 0 || nc < 0 || nr >= grid.nrows as i32 || nc >= grid.ncols as i32 {
        None
    } else {
        Some((nr as usize, nc as usize))
    }
}
