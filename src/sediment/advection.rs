//Advective solids fluxes.
//
//Advection carries solids with the gross water flows using upwind
//concentrations: outflow carries the local concentration, inflow
//carries the concentration of the source on the other side of the
//interface. Point loads (direction 0) are mass rates applied
//directly; reverse flow at a boundary carries the outlet boundary
//concentration. Floodplain fluxes (direction 9) are set by the
//floodplain transfer pass, not here. The global availability check
//happens in the concentration integrator.

use crate::constants::{DIR_BOUNDARY, DIR_POINT};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::state::State;

pub fn channel_solids_advection(
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
) {
    let scale = options.advchscale;

    for s in 0..state.nsolids {
        for l in 0..network.links.len() {
            for j in 0..network.links[l].n_nodes() {
                let node = &network.links[l].nodes[j];

                //Channel interfaces (directions 1..=8)
                for k in 1..=8usize {
                    let outflow = state.dqch_out[l][j][k] * scale;
                    state.adv_ch_outflux[s][l][j][k] = outflow * state.conc_ch[s][l][j];

                    let inflow = state.dqch_in[l][j][k] * scale;
                    if inflow > 0.0 {
                        if let Some((ml, mj)) = node.neighbour[k] {
                            state.adv_ch_influx[s][l][j][k] = inflow * state.conc_ch[s][ml][mj];
                        }
                    }
                }
            }

            //Domain boundary at the last node of an outlet link
            if let Some(outlet_id) = network.links[l].outlet {
                let j = network.links[l].last_node();
                let outflow = state.dqch_out[l][j][DIR_BOUNDARY] * scale;
                state.adv_ch_outflux[s][l][j][DIR_BOUNDARY] = outflow * state.conc_ch[s][l][j];

                let inflow = state.dqch_in[l][j][DIR_BOUNDARY] * scale;
                let cbc = forcing.value_or_zero(forcing.cbc[outlet_id][s]);
                state.adv_ch_influx[s][l][j][DIR_BOUNDARY] = inflow * cbc;
            }
        }
    }

    //Point loads: external solids mass rates (g/s). A negative load is
    //a sink and is carried as direction-0 outflux so the availability
    //scaling can limit it.
    for load in forcing.swch.iter() {
        let rate = forcing.value(load.function);
        let (l, j) = (load.row_or_link, load.col_or_node);
        if rate >= 0.0 {
            state.adv_ch_influx[load.solid][l][j][DIR_POINT] += rate;
        } else {
            state.adv_ch_outflux[load.solid][l][j][DIR_POINT] += rate.abs();
        }
    }
}

pub fn overland_solids_advection(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
) {
    let scale = options.advovscale;

    for s in 0..state.nsolids {
        for row in 0..grid.nrows {
            for col in 0..grid.ncols {
                if !grid.is_active(row, col) {
                    continue;
                }

                //Cell interfaces (the router populates the cardinal
                //directions; the loop covers all eight for generality)
                for k in 1..=8usize {
                    let outflow = state.dqov_out[row][col][k] * scale;
                    state.adv_ov_outflux[s][row][col][k] = outflow * state.conc_ov[s][row][col];

                    let inflow = state.dqov_in[row][col][k] * scale;
                    if inflow > 0.0 {
                        if let Some((nr, nc)) = grid.neighbour(row, col, k) {
                            state.adv_ov_influx[s][row][col][k] = inflow * state.conc_ov[s][nr][nc];
                        }
                    }
                }
            }
        }

        //Domain boundary at designated outlet cells
        for (k, outlet) in network.outlets.iter().enumerate() {
            let (row, col) = (outlet.row, outlet.col);
            let outflow = state.dqov_out[row][col][DIR_BOUNDARY] * scale;
            state.adv_ov_outflux[s][row][col][DIR_BOUNDARY] = outflow * state.conc_ov[s][row][col];

            let inflow = state.dqov_in[row][col][DIR_BOUNDARY] * scale;
            let cbc = forcing.value_or_zero(forcing.cbc[k][s]);
            state.adv_ov_influx[s][row][col][DIR_BOUNDARY] = inflow * cbc;
        }
    }

    for load in forcing.swov.iter() {
        let rate = forcing.value(load.function);
        let (row, col) = (load.row_or_link, load.col_or_node);
        if rate >= 0.0 {
            state.adv_ov_influx[load.solid][row][col][DIR_POINT] += rate;
        } else {
            state.adv_ov_outflux[load.solid][row][col][DIR_POINT] += rate.abs();
        }
    }
}
