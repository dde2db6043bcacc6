//Mass-balance accounting.
//
//Captures the initial water and solids state of the domain, and at any
//point during or after a run assembles a summary document comparing
//initial storage plus inflows against outflows plus final storage.
//Volumes are in m3 and masses in kg; the solver works in g internally
//and converts at accumulation.

use serde_derive::Serialize;

use crate::constants::DIR_BOUNDARY;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::solids::SolidsClass;
use crate::state::State;

#[derive(Debug)]
#[derive(Clone)]
#[derive(Default)]
pub struct InitialState {
    pub water_ov_vol: f64,          //initial overland water volume (m3)
    pub water_ch_vol: f64,          //initial channel water volume (m3)
    pub swe_ov_vol: f64,            //initial snowpack volume as swe (m3)
    pub solids_wc_mass: Vec<f64>,   //initial water column mass per class (kg)
    pub solids_bed_mass: Vec<f64>,  //initial bed/soil mass per class (kg)
}

//Capture the state of the domain before the first tick.
pub fn capture_initial_state(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &State,
    solids: &[SolidsClass],
) -> InitialState {
    let mut initial = InitialState {
        solids_wc_mass: vec![0.0; solids.len()],
        solids_bed_mass: vec![0.0; solids.len()],
        ..Default::default()
    };
    let w = grid.cell_size;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            let aovsurf = w * w - achsurf;

            initial.water_ov_vol += state.h_ov[row][col] * aovsurf;
            initial.swe_ov_vol += state.swe_ov[row][col] * aovsurf;

            for s in 0..solids.len() {
                initial.solids_wc_mass[s] +=
                    state.conc_ov[s][row][col] * state.h_ov[row][col] * aovsurf / 1000.0;
                for layer in 0..state.nstack_ov[row][col] {
                    initial.solids_bed_mass[s] += state.conc_bed_ov[s][row][col][layer]
                        * state.vlayer_ov[row][col][layer]
                        / 1000.0;
                }
            }
        }
    }

    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let watervol = node.storage_volume(state.h_ch[l][j]);
            initial.water_ch_vol += watervol;

            for s in 0..solids.len() {
                initial.solids_wc_mass[s] += state.conc_ch[s][l][j] * watervol / 1000.0;
                for layer in 0..state.nstack_ch[l][j] {
                    initial.solids_bed_mass[s] +=
                        state.conc_bed_ch[s][l][j][layer] * state.vlayer_ch[l][j][layer] / 1000.0;
                }
            }
        }
    }

    initial
}

//Final water volume currently stored in the domain (m3)
pub fn stored_water_volume(grid: &Grid, network: &ChannelNetwork, state: &State) -> (f64, f64) {
    let w = grid.cell_size;
    let mut vol_ov = 0.0;
    let mut vol_ch = 0.0;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            vol_ov += state.h_ov[row][col] * (w * w - achsurf);
        }
    }
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            vol_ch += network.links[l].nodes[j].storage_volume(state.h_ch[l][j]);
        }
    }
    (vol_ov, vol_ch)
}

//Solids mass currently stored in the domain, (water column, bed) in kg
pub fn stored_solids_mass(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &State,
    nsolids: usize,
) -> (Vec<f64>, Vec<f64>) {
    let w = grid.cell_size;
    let mut wc = vec![0.0; nsolids];
    let mut bed = vec![0.0; nsolids];

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            let watervol = state.h_ov[row][col] * (w * w - achsurf);
            for s in 0..nsolids {
                wc[s] += state.conc_ov[s][row][col] * watervol / 1000.0;
                for layer in 0..state.nstack_ov[row][col] {
                    bed[s] += state.conc_bed_ov[s][row][col][layer]
                        * state.vlayer_ov[row][col][layer]
                        / 1000.0;
                }
            }
        }
    }
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let watervol = network.links[l].nodes[j].storage_volume(state.h_ch[l][j]);
            for s in 0..nsolids {
                wc[s] += state.conc_ch[s][l][j] * watervol / 1000.0;
                for layer in 0..state.nstack_ch[l][j] {
                    bed[s] += state.conc_bed_ch[s][l][j][layer] * state.vlayer_ch[l][j][layer] / 1000.0;
                }
            }
        }
    }
    (wc, bed)
}

#[derive(Debug)]
#[derive(Clone)]
#[derive(Serialize)]
pub struct WaterBalanceSummary {
    pub initial_volume: f64,
    pub initial_swe_volume: f64,
    pub rain_volume: f64,
    pub swe_volume: f64,
    pub external_inflow_volume: f64,
    pub boundary_inflow_volume: f64,
    pub boundary_outflow_volume: f64,
    pub transmission_loss_volume: f64,
    pub final_volume: f64,
    pub final_swe_volume: f64,
    pub residual: f64,
}

#[derive(Debug)]
#[derive(Clone)]
#[derive(Serialize)]
pub struct SolidsBalanceSummary {
    pub name: String,
    pub initial_water_column_mass: f64,
    pub initial_bed_mass: f64,
    pub load_mass: f64,
    pub boundary_outflow_mass: f64,
    pub boundary_inflow_mass: f64,
    pub final_water_column_mass: f64,
    pub final_bed_mass: f64,
    pub residual: f64,
}

#[derive(Debug)]
#[derive(Clone)]
#[derive(Serialize)]
pub struct OutletSummary {
    pub outlet: usize,
    pub peak_channel_flow: f64,
    pub time_of_peak_channel_flow: f64,
    pub peak_overland_flow: f64,
    pub time_of_peak_overland_flow: f64,
    pub peak_total_solids_discharge: f64,
    pub time_of_peak_total_solids_discharge: f64,
    pub peak_solids_discharge_by_class: Vec<f64>,
    pub time_of_peak_solids_discharge_by_class: Vec<f64>,
}

#[derive(Debug)]
#[derive(Clone)]
#[derive(Serialize)]
pub struct MassBalanceSummary {
    pub simulated_time: f64,
    pub max_courant_overland: f64,
    pub max_courant_channel: f64,
    pub water: WaterBalanceSummary,
    pub solids: Vec<SolidsBalanceSummary>,
    pub outlets: Vec<OutletSummary>,
}

//Assemble the end-of-run (or mid-run) summary.
pub fn summarize(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &State,
    solids: &[SolidsClass],
    options: &ProcessOptions,
    initial: &InitialState,
    simulated_time: f64,
    max_courant_ov: f64,
    max_courant_ch: f64,
) -> MassBalanceSummary {
    //Water totals
    let mut rain_volume = 0.0;
    let mut swe_volume = 0.0;
    let mut external_inflow = 0.0;
    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            rain_volume += state.net_rain_vol[row][col];
            swe_volume += state.net_swe_vol[row][col];
            external_inflow += state.qwov_vol[row][col];
        }
    }
    let mut transmission_loss = 0.0;
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            external_inflow += state.qwch_vol[l][j];
            if options.ctlopt > 0 {
                transmission_loss += state.transloss_vol[l][j];
            }
        }
    }

    let mut boundary_out = 0.0;
    let mut boundary_in = 0.0;
    for l in 0..network.links.len() {
        boundary_out += state.q_out_link_vol[l];
        boundary_in += state.q_in_link_vol[l];
    }
    for k in 0..network.outlets.len() {
        boundary_out += state.q_out_ov_vol[k];
        //reverse overland flow entering at a specified-depth boundary
        let outlet = &network.outlets[k];
        boundary_in += state.dqov_in_vol[outlet.row][outlet.col][DIR_BOUNDARY];
    }

    let (final_ov, final_ch) = stored_water_volume(grid, network, state);
    let initial_volume = initial.water_ov_vol + initial.water_ch_vol;
    let final_volume = final_ov + final_ch;

    //the snowpack is its own storage: snowfall enters it overland and
    //joins the water column directly in channels
    let mut final_swe_volume = 0.0;
    let w = grid.cell_size;
    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            final_swe_volume += state.swe_ov[row][col] * (w * w - achsurf);
        }
    }

    let residual = initial_volume + initial.swe_ov_vol + rain_volume + swe_volume + external_inflow
        + boundary_in
        - boundary_out
        - transmission_loss
        - final_volume
        - final_swe_volume;

    let water = WaterBalanceSummary {
        initial_volume,
        initial_swe_volume: initial.swe_ov_vol,
        rain_volume,
        swe_volume,
        external_inflow_volume: external_inflow,
        boundary_inflow_volume: boundary_in,
        boundary_outflow_volume: boundary_out,
        transmission_loss_volume: transmission_loss,
        final_volume,
        final_swe_volume,
        residual,
    };

    //Solids totals per class
    let (final_wc, final_bed) = stored_solids_mass(grid, network, state, solids.len());
    let mut solids_summaries = vec![];
    for s in 0..solids.len() {
        let mut boundary_outflow_mass = 0.0;
        let mut boundary_inflow_mass = 0.0;
        for k in 0..network.outlets.len() {
            boundary_outflow_mass += state.total_adv_sed_out_ch[s][k]
                + state.total_dsp_sed_out_ch[s][k]
                + state.total_adv_sed_out_ov[s][k];
            boundary_inflow_mass += state.total_adv_sed_in_ch[s][k]
                + state.total_dsp_sed_in_ch[s][k]
                + state.total_adv_sed_in_ov[s][k];
        }
        let load_mass = state.total_load_ov[s] + state.total_load_ch[s];
        let initial_mass = initial.solids_wc_mass[s] + initial.solids_bed_mass[s];
        let final_mass = final_wc[s] + final_bed[s];
        let residual = initial_mass + load_mass + boundary_inflow_mass
            - boundary_outflow_mass
            - final_mass;

        solids_summaries.push(SolidsBalanceSummary {
            name: solids[s].name.clone(),
            initial_water_column_mass: initial.solids_wc_mass[s],
            initial_bed_mass: initial.solids_bed_mass[s],
            load_mass,
            boundary_outflow_mass,
            boundary_inflow_mass,
            final_water_column_mass: final_wc[s],
            final_bed_mass: final_bed[s],
            residual,
        });
    }

    //Outlet peaks
    let mut outlets = vec![];
    for k in 0..network.outlets.len() {
        let mut class_peaks = vec![];
        let mut class_times = vec![];
        for s in 0..solids.len() {
            class_peaks.push(state.sedflow_peak_ch[s + 1][k].max(state.sedflow_peak_ov[s + 1][k]));
            class_times.push(if state.sedflow_peak_ch[s + 1][k] >= state.sedflow_peak_ov[s + 1][k] {
                state.sedtime_peak_ch[s + 1][k]
            } else {
                state.sedtime_peak_ov[s + 1][k]
            });
        }
        outlets.push(OutletSummary {
            outlet: k,
            peak_channel_flow: state.q_peak_ch[k],
            time_of_peak_channel_flow: state.t_peak_ch[k],
            peak_overland_flow: state.q_peak_ov[k],
            time_of_peak_overland_flow: state.t_peak_ov[k],
            peak_total_solids_discharge: state.sedflow_peak_ch[0][k].max(state.sedflow_peak_ov[0][k]),
            time_of_peak_total_solids_discharge: if state.sedflow_peak_ch[0][k]
                >= state.sedflow_peak_ov[0][k]
            {
                state.sedtime_peak_ch[0][k]
            } else {
                state.sedtime_peak_ov[0][k]
            },
            peak_solids_discharge_by_class: class_peaks,
            time_of_peak_solids_discharge_by_class: class_times,
        });
    }

    MassBalanceSummary {
        simulated_time,
        max_courant_overland: max_courant_ov,
        max_courant_channel: max_courant_ch,
        water,
        solids: solids_summaries,
        outlets,
    }
}
