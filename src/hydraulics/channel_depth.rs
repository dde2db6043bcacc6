//Channel water depth integration.
//
//Builds the volumetric derivative for every node from direct
//precipitation, transmission loss and the net routed flow, integrates
//it over the step and inverts the trapezoidal stage-storage relation
//to recover the new depth. Also accumulates the cumulative water
//mass-balance variables and searches for peak outlet flow.

use crate::constants::{DIR_BOUNDARY, DIR_FLOODPLAIN, DIR_POINT, TOLERANCE};
use crate::errors::{ErrorKind, SimulationError};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::numerical::mathfn::quadratic_plus;
use crate::options::ProcessOptions;
use crate::state::State;

pub fn channel_water_depth(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
    dt: f64,
    time: f64,
) -> Result<(), SimulationError> {
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let (row, col) = (node.row, node.col);

            let bwch = node.bottom_width;
            let hbch = node.bank_height;
            let sslope = node.side_slope;
            let lch = node.length;
            let achsurf = node.surface_area();
            let vchbank = node.bank_volume();

            //Build the volumetric derivative term by term (m3/s).
            //Rain and snow fall directly onto the channel water surface;
            //no interception occurs over the channel part of a cell.
            let mut derivative = state.net_rain_rate[row][col] * achsurf;
            if options.snowopt > 0 {
                derivative += state.net_swe_rate[row][col] * achsurf;
            }
            if options.ctlopt > 0 {
                derivative -= node.transloss_rate * bwch * lch;
            }
            derivative += state.dqch[l][j];

            //Volume entering (or leaving) the node over this step
            let mut vchin = derivative * dt;

            let hch = state.h_ch[l][j];
            let mut hchnew;

            if hch < hbch {
                //Water volume at present depth and the unfilled volume
                //up to the top of bank
                let vch = (bwch + sslope * hch) * hch * lch;
                let vchavail = vchbank - vch;

                if vchin <= vchavail {
                    //The inflow fits inside the bank: add it and invert
                    //the trapezoid for the new depth
                    let vchnew = vch + vchin;
                    let achnew = vchnew / lch;
                    if sslope > 0.0 {
                        //positive root of z*h^2 + bw*h - A = 0
                        hchnew = quadratic_plus(sslope, bwch, -achnew);
                    } else {
                        //rectangular channel
                        hchnew = achnew / bwch;
                    }
                } else {
                    //Overtopping: fill to the top of bank, then add the
                    //remainder as a rectangular block over the full
                    //channel surface area
                    hchnew = hbch;
                    vchin -= vchavail;
                    hchnew += vchin / achsurf;
                }
            } else {
                //Already above the bank: the whole inflow stacks as a
                //rectangular block
                hchnew = hch + vchin / achsurf;
            }

            if hchnew < 0.0 {
                if hchnew.abs() < TOLERANCE {
                    //round-off: clamp to exactly zero
                    hchnew = 0.0;
                } else {
                    //numerical instability: abort with location
                    return Err(SimulationError::new(
                        ErrorKind::NegativeDepth,
                        l,
                        j,
                        0,
                        &format!("new channel depth = {}", hchnew),
                    ));
                }
            }
            if hchnew < TOLERANCE {
                hchnew = 0.0;
            }
            state.h_ch_new[l][j] = hchnew;

            //=== cumulative mass balance variables ===

            //Direct precipitation onto the channel surface counts as
            //net rain/snow of the host cell
            state.net_rain_vol[row][col] += state.gross_rain_rate[row][col] * achsurf * dt;
            if options.snowopt > 0 {
                state.net_swe_vol[row][col] += state.gross_swe_rate[row][col] * achsurf * dt;
            }

            if options.ctlopt > 0 {
                state.transloss_depth[l][j] += node.transloss_rate * dt;
                state.transloss_vol[l][j] += node.transloss_rate * node.bed_area() * dt;
            }

            //Gross flow volumes through the eight channel directions
            for k in 1..=8usize {
                state.dqch_out_vol[l][j][k] += state.dqch_out[l][j][k] * dt;
                state.dqch_in_vol[l][j][k] += state.dqch_in[l][j][k] * dt;
            }
        }

        //Boundary volumes for the link (zero except at outlet links)
        state.q_out_link_vol[l] += state.q_out_link[l] * dt;
        state.q_in_link_vol[l] += state.q_in_link[l] * dt;

        let j = network.links[l].last_node();
        state.dqch_out_vol[l][j][DIR_BOUNDARY] += state.dqch_out[l][j][DIR_BOUNDARY] * dt;
        state.dqch_in_vol[l][j][DIR_BOUNDARY] += state.dqch_in[l][j][DIR_BOUNDARY] * dt;
    }

    //Point source volumes (direction 0)
    for source in forcing.qwch.iter() {
        let q = forcing.value(source.function);
        state.dqch_in_vol[source.link][source.node][DIR_POINT] += q * dt;
        state.qwch_vol[source.link][source.node] += q * dt;
    }

    //Floodplain transfer volumes (direction 9, both sides of the pair)
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let (row, col) = (node.row, node.col);

            state.dqch_in_vol[l][j][DIR_FLOODPLAIN] += state.dqch_in[l][j][DIR_FLOODPLAIN] * dt;
            state.dqov_out_vol[row][col][DIR_FLOODPLAIN] +=
                state.dqov_out[row][col][DIR_FLOODPLAIN] * dt;

            if options.fldopt > 0 {
                state.dqch_out_vol[l][j][DIR_FLOODPLAIN] += state.dqch_out[l][j][DIR_FLOODPLAIN] * dt;
                state.dqov_in_vol[row][col][DIR_FLOODPLAIN] +=
                    state.dqov_in[row][col][DIR_FLOODPLAIN] * dt;
            }
        }
    }

    //Peak channel flow at watershed outlets
    for k in 0..network.outlets.len() {
        let outlet = &network.outlets[k];
        if let Some((l, _)) = grid.channel_at(outlet.row, outlet.col) {
            if state.q_out_link[l] > state.q_peak_ch[k] {
                state.q_peak_ch[k] = state.q_out_link[l];
                state.t_peak_ch[k] = time;
            }
        }
    }

    Ok(())
}
