//Concentration integrators for the water column and the surface bed
//layer.
//
//The water column update assembles influx and outflux from every
//process, checks the total outflux potential against the mass actually
//present, and scales the aggregate outflux uniformly when the
//potential exceeds availability. The uniform scaling preserves the
//proportional contribution of each sink and keeps concentrations
//non-negative to within round-off. Cumulative per-process masses are
//accumulated here, as are peak solids discharges at outlets.
//
//The bed update runs in two passes: a volume pass that converts the
//deposited and eroded masses of every class into a new surface layer
//volume through the class bulk densities, and a concentration pass
//that divides the new class masses by that volume. Surface layers
//hitting their volume bounds raise push/pop flags for the stack
//manager.

use crate::constants::{DIR_BOUNDARY, DIR_POINT, TOLERANCE};
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::solids::SolidsClass;
use crate::state::State;

pub fn channel_solids_concentration(
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    dt: f64,
    time: f64,
) {
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];

            //Present and new water column volumes (m3)
            let watervol = node.storage_volume(state.h_ch[l][j]);
            let newwatervol = node.storage_volume(state.h_ch_new[l][j]);

            let is_outlet_node = network.links[l].outlet.is_some() && j == network.links[l].last_node();
            let top = state.nstack_ch[l][j] - 1;

            for s in 0..solids.len() {
                //Assemble the derivative term by term (g/s)
                let mut advectionin = 0.0;
                let mut advectionout = 0.0;
                let mut dispersionin = 0.0;
                let mut dispersionout = 0.0;

                //sources 0-8 and the floodplain (9)
                for k in 0..=9usize {
                    advectionin += state.adv_ch_influx[s][l][j][k];
                    advectionout += state.adv_ch_outflux[s][l][j][k];
                    dispersionin += state.dsp_ch_influx[s][l][j][k];
                    dispersionout += state.dsp_ch_outflux[s][l][j][k];
                }

                //the domain boundary (10) at an outlet node
                if is_outlet_node {
                    advectionin += state.adv_ch_influx[s][l][j][DIR_BOUNDARY];
                    advectionout += state.adv_ch_outflux[s][l][j][DIR_BOUNDARY];
                    dispersionin += state.dsp_ch_influx[s][l][j][DIR_BOUNDARY];
                    dispersionout += state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY];
                }

                let erosion = state.ers_ch_influx_wc[s][l][j];
                let deposition = state.dep_ch_outflux_wc[s][l][j];

                let influx = advectionin + dispersionin + erosion + state.kin_ch_influx[s][l][j];
                let mut outflux =
                    advectionout + dispersionout + deposition + state.kin_ch_outflux[s][l][j];

                //The sum of individually limited process fluxes can
                //still exceed availability through round-off, so the
                //total is checked and scaled uniformly across sinks
                let potential = outflux * dt;
                let available = state.conc_ch[s][l][j] * watervol;
                if potential > available {
                    outflux = (available / potential) * outflux;
                }

                //=== cumulative masses (kg) ===
                state.dep_ch_outmass_wc[s][l][j] += state.dep_ch_outflux_wc[s][l][j] * dt / 1000.0;
                state.dep_ch_inmass_bed[s][l][j] += state.dep_ch_influx_bed[s][l][j] * dt / 1000.0;
                state.ers_ch_outmass_bed[s][l][j] += state.ers_ch_outflux_bed[s][l][j] * dt / 1000.0;
                state.ers_ch_inmass_wc[s][l][j] += state.ers_ch_influx_wc[s][l][j] * dt / 1000.0;

                //point loads (source 0)
                state.adv_ch_inmass[s][l][j][DIR_POINT] +=
                    state.adv_ch_influx[s][l][j][DIR_POINT] * dt / 1000.0;
                state.adv_ch_outmass[s][l][j][DIR_POINT] +=
                    state.adv_ch_outflux[s][l][j][DIR_POINT] * dt / 1000.0;
                state.total_load_ch[s] += (state.adv_ch_influx[s][l][j][DIR_POINT]
                    - state.adv_ch_outflux[s][l][j][DIR_POINT])
                    * dt
                    / 1000.0;

                //sources 1-8 and the floodplain
                for k in 1..=9usize {
                    state.adv_ch_inmass[s][l][j][k] += state.adv_ch_influx[s][l][j][k] * dt / 1000.0;
                    state.adv_ch_outmass[s][l][j][k] +=
                        state.adv_ch_outflux[s][l][j][k] * dt / 1000.0;
                    state.dsp_ch_inmass[s][l][j][k] += state.dsp_ch_influx[s][l][j][k] * dt / 1000.0;
                    state.dsp_ch_outmass[s][l][j][k] +=
                        state.dsp_ch_outflux[s][l][j][k] * dt / 1000.0;
                }

                //boundary totals and the per-class peak discharge
                if is_outlet_node {
                    let outlet_id = network.links[l].outlet.unwrap();

                    state.adv_ch_inmass[s][l][j][DIR_BOUNDARY] +=
                        state.adv_ch_influx[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.adv_ch_outmass[s][l][j][DIR_BOUNDARY] +=
                        state.adv_ch_outflux[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.dsp_ch_inmass[s][l][j][DIR_BOUNDARY] +=
                        state.dsp_ch_influx[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.dsp_ch_outmass[s][l][j][DIR_BOUNDARY] +=
                        state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY] * dt / 1000.0;

                    state.total_adv_sed_out_ch[s][outlet_id] +=
                        state.adv_ch_outflux[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.total_adv_sed_in_ch[s][outlet_id] +=
                        state.adv_ch_influx[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.total_dsp_sed_out_ch[s][outlet_id] +=
                        state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY] * dt / 1000.0;
                    state.total_dsp_sed_in_ch[s][outlet_id] +=
                        state.dsp_ch_influx[s][l][j][DIR_BOUNDARY] * dt / 1000.0;

                    //solids discharge: advection plus dispersion (kg/s)
                    let sedflow = (state.adv_ch_outflux[s][l][j][DIR_BOUNDARY]
                        + state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY])
                        / 1000.0;
                    if sedflow > state.sedflow_peak_ch[s + 1][outlet_id] {
                        state.sedflow_peak_ch[s + 1][outlet_id] = sedflow;
                        state.sedtime_peak_ch[s + 1][outlet_id] = time;
                    }
                }

                //numerical integration in three steps: new mass, new
                //concentration, then the instability check
                let derivative = influx - outflux;
                let newmass = available + derivative * dt;

                if newwatervol > 0.0 {
                    state.conc_ch_new[s][l][j] = newmass / newwatervol;
                } else {
                    state.conc_ch_new[s][l][j] = 0.0;
                }

                if newmass < 0.0 {
                    if newmass.abs() >= TOLERANCE {
                        //possible instability: warn but do not abort
                        eprintln!(
                            "warning: negative solids mass {} (solid {}) at channel link {} node {}; concentration clamped to zero",
                            newmass, s, l, j
                        );
                    }
                    state.conc_ch_new[s][l][j] = 0.0;
                }
            }

            //Peak total solids discharge (summed after the per-class
            //peaks so the two may occur at different ticks)
            if is_outlet_node {
                let outlet_id = network.links[l].outlet.unwrap();
                let mut sedflowtotal = 0.0;
                for s in 0..solids.len() {
                    sedflowtotal += (state.adv_ch_outflux[s][l][j][DIR_BOUNDARY]
                        + state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY])
                        / 1000.0;
                }
                if sedflowtotal > state.sedflow_peak_ch[0][outlet_id] {
                    state.sedflow_peak_ch[0][outlet_id] = sedflowtotal;
                    state.sedtime_peak_ch[0][outlet_id] = time;
                }
            }

            //=== surface bed layer update ===
            update_bed_layer(
                &mut state.vlayer_ch[l][j],
                &mut state.vlayer_ch_new[l][j],
                &mut state.conc_bed_ch,
                &mut state.conc_bed_ch_new,
                &state.dep_ch_influx_bed,
                &state.ers_ch_outflux_bed,
                &state.porosity_ch[l][j],
                &state.min_vlayer_ch[l][j],
                &state.max_vlayer_ch[l][j],
                &mut state.push_ch[l][j],
                &mut state.pop_ch[l][j],
                solids,
                l,
                j,
                top,
                dt,
            );
        }
    }
}

pub fn overland_solids_concentration(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    dt: f64,
    time: f64,
) {
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
            let watervol = state.h_ov[row][col] * aovsurf;
            let newwatervol = state.h_ov_new[row][col] * aovsurf;

            let outlet_id = network
                .outlets
                .iter()
                .position(|o| o.row == row && o.col == col)
                .unwrap_or(usize::MAX);
            let top = state.nstack_ov[row][col] - 1;

            for s in 0..solids.len() {
                let mut advectionin = 0.0;
                let mut advectionout = 0.0;
                let mut dispersionin = 0.0;
                let mut dispersionout = 0.0;

                for k in 0..=9usize {
                    advectionin += state.adv_ov_influx[s][row][col][k];
                    advectionout += state.adv_ov_outflux[s][row][col][k];
                    dispersionin += state.dsp_ov_influx[s][row][col][k];
                    dispersionout += state.dsp_ov_outflux[s][row][col][k];
                }
                if outlet_id != usize::MAX {
                    advectionin += state.adv_ov_influx[s][row][col][DIR_BOUNDARY];
                    advectionout += state.adv_ov_outflux[s][row][col][DIR_BOUNDARY];
                    dispersionin += state.dsp_ov_influx[s][row][col][DIR_BOUNDARY];
                    dispersionout += state.dsp_ov_outflux[s][row][col][DIR_BOUNDARY];
                }

                let erosion = state.ers_ov_influx_wc[s][row][col];
                let deposition = state.dep_ov_outflux_wc[s][row][col];

                let influx = advectionin + dispersionin + erosion + state.kin_ov_influx[s][row][col];
                let mut outflux =
                    advectionout + dispersionout + deposition + state.kin_ov_outflux[s][row][col];

                let potential = outflux * dt;
                let available = state.conc_ov[s][row][col] * watervol;
                if potential > available {
                    outflux = (available / potential) * outflux;
                }

                //=== cumulative masses (kg) ===
                state.dep_ov_outmass_wc[s][row][col] +=
                    state.dep_ov_outflux_wc[s][row][col] * dt / 1000.0;
                state.dep_ov_inmass_bed[s][row][col] +=
                    state.dep_ov_influx_bed[s][row][col] * dt / 1000.0;
                state.ers_ov_outmass_bed[s][row][col] +=
                    state.ers_ov_outflux_bed[s][row][col] * dt / 1000.0;
                state.ers_ov_inmass_wc[s][row][col] +=
                    state.ers_ov_influx_wc[s][row][col] * dt / 1000.0;

                state.adv_ov_inmass[s][row][col][DIR_POINT] +=
                    state.adv_ov_influx[s][row][col][DIR_POINT] * dt / 1000.0;
                state.adv_ov_outmass[s][row][col][DIR_POINT] +=
                    state.adv_ov_outflux[s][row][col][DIR_POINT] * dt / 1000.0;
                state.total_load_ov[s] += (state.adv_ov_influx[s][row][col][DIR_POINT]
                    - state.adv_ov_outflux[s][row][col][DIR_POINT])
                    * dt
                    / 1000.0;

                for k in 1..=9usize {
                    state.adv_ov_inmass[s][row][col][k] +=
                        state.adv_ov_influx[s][row][col][k] * dt / 1000.0;
                    state.adv_ov_outmass[s][row][col][k] +=
                        state.adv_ov_outflux[s][row][col][k] * dt / 1000.0;
                    state.dsp_ov_inmass[s][row][col][k] +=
                        state.dsp_ov_influx[s][row][col][k] * dt / 1000.0;
                    state.dsp_ov_outmass[s][row][col][k] +=
                        state.dsp_ov_outflux[s][row][col][k] * dt / 1000.0;
                }

                if outlet_id != usize::MAX {
                    state.adv_ov_inmass[s][row][col][DIR_BOUNDARY] +=
                        state.adv_ov_influx[s][row][col][DIR_BOUNDARY] * dt / 1000.0;
                    state.adv_ov_outmass[s][row][col][DIR_BOUNDARY] +=
                        state.adv_ov_outflux[s][row][col][DIR_BOUNDARY] * dt / 1000.0;

                    state.total_adv_sed_out_ov[s][outlet_id] +=
                        state.adv_ov_outflux[s][row][col][DIR_BOUNDARY] * dt / 1000.0;
                    state.total_adv_sed_in_ov[s][outlet_id] +=
                        state.adv_ov_influx[s][row][col][DIR_BOUNDARY] * dt / 1000.0;

                    let sedflow = (state.adv_ov_outflux[s][row][col][DIR_BOUNDARY]
                        + state.dsp_ov_outflux[s][row][col][DIR_BOUNDARY])
                        / 1000.0;
                    if sedflow > state.sedflow_peak_ov[s + 1][outlet_id] {
                        state.sedflow_peak_ov[s + 1][outlet_id] = sedflow;
                        state.sedtime_peak_ov[s + 1][outlet_id] = time;
                    }
                }

                let derivative = influx - outflux;
                let newmass = available + derivative * dt;

                if newwatervol > 0.0 {
                    state.conc_ov_new[s][row][col] = newmass / newwatervol;
                } else {
                    state.conc_ov_new[s][row][col] = 0.0;
                }

                if newmass < 0.0 {
                    if newmass.abs() >= TOLERANCE {
                        eprintln!(
                            "warning: negative solids mass {} (solid {}) at cell ({}, {}); concentration clamped to zero",
                            newmass, s, row, col
                        );
                    }
                    state.conc_ov_new[s][row][col] = 0.0;
                }
            }

            //peak total solids discharge at an overland outlet cell
            if outlet_id != usize::MAX {
                let mut sedflowtotal = 0.0;
                for s in 0..solids.len() {
                    sedflowtotal += (state.adv_ov_outflux[s][row][col][DIR_BOUNDARY]
                        + state.dsp_ov_outflux[s][row][col][DIR_BOUNDARY])
                        / 1000.0;
                }
                if sedflowtotal > state.sedflow_peak_ov[0][outlet_id] {
                    state.sedflow_peak_ov[0][outlet_id] = sedflowtotal;
                    state.sedtime_peak_ov[0][outlet_id] = time;
                }
            }

            //=== surface soil layer update ===
            update_bed_layer(
                &mut state.vlayer_ov[row][col],
                &mut state.vlayer_ov_new[row][col],
                &mut state.conc_bed_ov,
                &mut state.conc_bed_ov_new,
                &state.dep_ov_influx_bed,
                &state.ers_ov_outflux_bed,
                &state.porosity_ov[row][col],
                &state.min_vlayer_ov[row][col],
                &state.max_vlayer_ov[row][col],
                &mut state.push_ov[row][col],
                &mut state.pop_ov[row][col],
                solids,
                row,
                col,
                top,
                dt,
            );
        }
    }
}

//Two-pass surface layer update shared by the channel and overland
//integrators. The flux slices are indexed [solid][i][j].
fn update_bed_layer(
    vlayer: &mut Vec<f64>,
    vlayer_new: &mut Vec<f64>,
    conc_bed: &mut [Vec<Vec<Vec<f64>>>],
    conc_bed_new: &mut [Vec<Vec<Vec<f64>>>],
    dep_influx: &[Vec<Vec<f64>>],
    ers_outflux: &[Vec<Vec<f64>>],
    porosity: &[f64],
    min_vlayer: &[f64],
    max_vlayer: &[f64],
    push_flag: &mut bool,
    pop_flag: &mut bool,
    solids: &[SolidsClass],
    i: usize,
    j: usize,
    top: usize,
    dt: f64,
) {
    let sedvol = vlayer[top];

    //Volume pass: convert the net deposited mass of each class into a
    //volume change through its bulk density
    let mut newsedvol = 0.0;
    for s in 0..solids.len() {
        let sedmass = conc_bed[s][i][j][top] * sedvol;
        let depositedmass = dep_influx[s][i][j] * dt;
        let erodedmass = ers_outflux[s][i][j] * dt;
        let newsedmass = sedmass + depositedmass - erodedmass;

        let bulkdensity = solids[s].bulk_density(porosity[top]);
        newsedvol += newsedmass / (bulkdensity * 1000.0);
    }

    //As the layer empties, round-off can leave a residual volume that
    //should be exactly zero
    if newsedvol < TOLERANCE {
        newsedvol = 0.0;
    }

    //Concentration pass
    for s in 0..solids.len() {
        if newsedvol >= TOLERANCE {
            let sedmass = conc_bed[s][i][j][top] * sedvol;
            let sedderivative = dep_influx[s][i][j] - ers_outflux[s][i][j];
            let newsedmass = sedmass + sedderivative * dt;
            if newsedmass > 0.0 {
                conc_bed_new[s][i][j][top] = newsedmass / newsedvol;
            } else {
                conc_bed_new[s][i][j][top] = 0.0;
            }
        } else {
            conc_bed_new[s][i][j][top] = 0.0;
        }
    }

    vlayer_new[top] = newsedvol;

    //Stack signals for the layer manager
    if newsedvol >= max_vlayer[top] {
        *push_flag = true;
    }
    if newsedvol <= min_vlayer[top] && top > 0 {
        *pop_flag = true;
    }

    //subsurface layers carry over unchanged
    for layer in 0..top {
        vlayer_new[layer] = vlayer[layer];
        for s in 0..solids.len() {
            conc_bed_new[s][i][j][layer] = conc_bed[s][i][j][layer];
        }
    }
}
