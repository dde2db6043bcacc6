//Reporting stations.
//
//A station samples either the routed discharge (m3/s) or the water
//column solids concentrations (g/m3) at its cell on the reporting
//interval. Channel stations report the flow through the downstream
//interface(s) of their node, signed positive downstream; overland
//stations report the gross outflow of the cell. Sampled series are
//written as CSV at the end of the run.

use crate::constants::DIR_BOUNDARY;
use crate::grid::Grid;
use crate::io::csv_io::write_series;
use crate::network::ChannelNetwork;
use crate::state::State;

#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq)]
pub enum StationKind {
    Flow,
    Concentration,
}

#[derive(Debug)]
#[derive(Clone)]
pub struct Station {
    pub name: String,
    pub row: usize,
    pub col: usize,
    pub kind: StationKind,
}

#[derive(Debug)]
#[derive(Clone)]
pub struct Reporter {
    pub stations: Vec<Station>,
    pub interval: f64,      //reporting interval (s)
    next_report: f64,
    pub times: Vec<f64>,
    //samples per station; concentration stations carry one series per
    //solids class, flow stations a single series
    pub series: Vec<Vec<Vec<f64>>>,
}

impl Reporter {
    pub fn new(stations: Vec<Station>, interval: f64, nsolids: usize) -> Reporter {
        let series = stations
            .iter()
            .map(|station| match station.kind {
                StationKind::Flow => vec![vec![]],
                StationKind::Concentration => vec![vec![]; nsolids],
            })
            .collect();
        Reporter {
            stations,
            interval,
            next_report: 0.0,
            times: vec![],
            series,
        }
    }

    //Sample all stations if the reporting time has come.
    pub fn sample(&mut self, time: f64, grid: &Grid, network: &ChannelNetwork, state: &State) {
        if self.stations.is_empty() || time + 1.0e-12 < self.next_report {
            return;
        }
        self.next_report = time + self.interval;
        self.times.push(time);

        for (i, station) in self.stations.iter().enumerate() {
            match station.kind {
                StationKind::Flow => {
                    let q = sample_flow(grid, network, state, station.row, station.col);
                    self.series[i][0].push(q);
                }
                StationKind::Concentration => {
                    for s in 0..state.nsolids {
                        let c = match grid.channel_at(station.row, station.col) {
                            Some((l, j)) => state.conc_ch[s][l][j],
                            None => state.conc_ov[s][station.row][station.col],
                        };
                        self.series[i][s].push(c);
                    }
                }
            }
        }
    }

    //Write all sampled series to a CSV file with one time column.
    pub fn write(&self, path: &str) -> Result<(), String> {
        if self.stations.is_empty() {
            return Ok(());
        }
        let mut names = vec![];
        let mut columns = vec![];
        for (i, station) in self.stations.iter().enumerate() {
            match station.kind {
                StationKind::Flow => {
                    names.push(station.name.clone());
                    columns.push(self.series[i][0].clone());
                }
                StationKind::Concentration => {
                    for s in 0..self.series[i].len() {
                        names.push(format!("{}_solid{}", station.name, s + 1));
                        columns.push(self.series[i][s].clone());
                    }
                }
            }
        }
        write_series(path, &self.times, &names, &columns).map_err(String::from)
    }
}

//Discharge at a station cell: the signed flow through the downstream
//interface(s) of a channel node, or the gross outflow of an overland
//cell.
fn sample_flow(grid: &Grid, network: &ChannelNetwork, state: &State, row: usize, col: usize) -> f64 {
    match grid.channel_at(row, col) {
        Some((l, j)) => {
            let link = &network.links[l];
            if j < link.last_node() {
                let node = &link.nodes[j];
                let down = &link.nodes[j + 1];
                let kdown = Grid::direction_between(node.row, node.col, down.row, down.col)
                    .expect("validated topology");
                state.dqch_out[l][j][kdown] - state.dqch_in[l][j][kdown]
            } else {
                //junction: net downstream flow over all branches and
                //the boundary
                let mut q = 0.0;
                for dir in 1..=8usize {
                    if link.down_links[dir].is_some() {
                        q += state.dqch_out[l][j][dir] - state.dqch_in[l][j][dir];
                    }
                }
                q += state.dqch_out[l][j][DIR_BOUNDARY] - state.dqch_in[l][j][DIR_BOUNDARY];
                q
            }
        }
        None => {
            let mut q = 0.0;
            for k in 1..=8usize {
                q += state.dqov_out[row][col][k];
            }
            q + state.dqov_out[row][col][DIR_BOUNDARY]
        }
    }
}
