//Solids erosion fluxes.
//
//Two formulations, selected per domain by erschopt/ersovopt:
//
//  capacity-limited (option 1): erosion makes up the shortfall between
//  the transport capacity and the transport rate already satisfied by
//  the water column;
//
//  excess shear (option >= 2): erosion follows a power of the excess of
//  boundary shear stress over the critical shear stress, with the
//  cohesive variant remembering the maximum historical shear at each
//  location so re-exposure to a lower stress erodes nothing new.
//
//Either way the erosion flow is limited so the mass leaving the
//surface layer never exceeds what the layer holds.

use libm::pow;

use crate::constants::GAMMA_W;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::sediment::capacity::cell_friction_slope;
use crate::solids::{SolidsClass, CNC_COHESIVE, CNC_NONCOHESIVE};
use crate::state::State;

pub fn channel_solids_erosion(
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    options: &ProcessOptions,
    dt: f64,
    time: f64,
) {
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let hchan = state.h_ch[l][j];

            //Shear stress on the channel boundary: tau = gamma_w * Rh * sf
            let (area, wp) = node.conveyance_section(hchan, 0.0);
            let rh = if wp > 0.0 { area / wp } else { 0.0 };
            let sf = state.sf_ch[l][j].abs();
            let tau = GAMMA_W * rh * sf;

            let watervol = area * node.length;
            let top = state.nstack_ch[l][j] - 1;
            let abed = state.abed_ch[l][j][top];
            let porosity = state.porosity_ch[l][j][top];

            //new maximum shear candidate for the cohesive history
            let mut newtaumax = 0.0;
            let mut newtautime = 0.0;

            for s in 0..solids.len() {
                state.ers_flow_ch[s][l][j] = 0.0;

                let epsilon = if options.erschopt > 1 {
                    excess_shear_amount(
                        &solids[s],
                        tau,
                        state.tau_max_ch[l][j],
                        node.erodibility,
                        node.m_exponent,
                        &mut newtaumax,
                        &mut newtautime,
                        time,
                    )
                } else {
                    //Capacity-limited: transport rate = mass in the
                    //water column minus what already leaves this step
                    let available = state.conc_ch[s][l][j] * watervol;
                    let mut outflux = 0.0;
                    for k in 0..=10usize {
                        outflux += state.adv_ch_outflux[s][l][j][k];
                    }
                    //floodplain transfer runs after erosion, so its
                    //outflux must still be zero here
                    debug_assert!(state.adv_ch_outflux[s][l][j][9] == 0.0);

                    let mut transrate = available / dt - outflux - state.dep_ch_outflux_wc[s][l][j];
                    if transrate < 0.0 {
                        transrate = 0.0;
                    }
                    state.transrate_ch[s][l][j] = transrate;

                    if state.transcap_ch[s][l][j] > transrate {
                        (state.transcap_ch[s][l][j] - transrate) * dt / abed
                    } else {
                        0.0
                    }
                };

                let bulkdensity = solids[s].bulk_density(porosity);

                //erosion flow (m3/s), scaled by the process factor
                let mut ersflow = epsilon * abed / (bulkdensity * 1000.0) / dt;
                ersflow *= options.erschscale;

                //limit the flow to the mass held in the surface layer
                let potential = ersflow * state.conc_bed_ch[s][l][j][top] * dt;
                let available = state.vlayer_ch[l][j][top] * state.conc_bed_ch[s][l][j][top];
                if potential > available {
                    ersflow = available / potential * ersflow;
                }
                state.ers_flow_ch[s][l][j] = ersflow;

                //outflux from the surface layer and matching influx to
                //the water column (g/s)
                let flux = ersflow * state.conc_bed_ch[s][l][j][top];
                state.ers_ch_outflux_bed[s][l][j] = flux;
                state.ers_ch_influx_wc[s][l][j] = flux;
            }

            //update the shear stress exposure history
            if options.erschopt > 1 && newtaumax > state.tau_max_ch[l][j] {
                state.tau_max_ch[l][j] = newtaumax;
                state.tau_max_time_ch[l][j] = newtautime;
            }
        }
    }
}

pub fn overland_solids_erosion(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    options: &ProcessOptions,
    dt: f64,
    time: f64,
) {
    let w = grid.cell_size;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }

            //Shear stress on the ground surface: tau = gamma_w * h * |sf|
            let sf = cell_friction_slope(state, row, col);
            let tau = GAMMA_W * state.h_ov[row][col] * sf;

            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            let aovsurf = w * w - achsurf;
            let watervol = state.h_ov[row][col] * aovsurf;

            let top = state.nstack_ov[row][col] - 1;
            let abed = state.abed_ov[row][col][top];
            let porosity = state.porosity_ov[row][col][top];

            let mut newtaumax = 0.0;
            let mut newtautime = 0.0;

            for s in 0..solids.len() {
                state.ers_flow_ov[s][row][col] = 0.0;

                let epsilon = if options.ersovopt > 1 {
                    excess_shear_amount(
                        &solids[s],
                        tau,
                        state.tau_max_ov[row][col],
                        grid.erodibility[row][col],
                        grid.m_exponent[row][col],
                        &mut newtaumax,
                        &mut newtautime,
                        time,
                    )
                } else {
                    let available = state.conc_ov[s][row][col] * watervol;
                    let mut outflux = 0.0;
                    for k in 0..=10usize {
                        outflux += state.adv_ov_outflux[s][row][col][k];
                    }
                    debug_assert!(state.adv_ov_outflux[s][row][col][9] == 0.0);

                    let mut transrate =
                        available / dt - outflux - state.dep_ov_outflux_wc[s][row][col];
                    if transrate < 0.0 {
                        transrate = 0.0;
                    }
                    state.transrate_ov[s][row][col] = transrate;

                    if state.transcap_ov[s][row][col] > transrate {
                        (state.transcap_ov[s][row][col] - transrate) * dt / abed
                    } else {
                        0.0
                    }
                };

                let bulkdensity = solids[s].bulk_density(porosity);

                let mut ersflow = epsilon * abed / (bulkdensity * 1000.0) / dt;
                ersflow *= options.ersovscale;

                let potential = ersflow * state.conc_bed_ov[s][row][col][top] * dt;
                let available = state.vlayer_ov[row][col][top] * state.conc_bed_ov[s][row][col][top];
                if potential > available {
                    ersflow = available / potential * ersflow;
                }
                state.ers_flow_ov[s][row][col] = ersflow;

                let flux = ersflow * state.conc_bed_ov[s][row][col][top];
                state.ers_ov_outflux_bed[s][row][col] = flux;
                state.ers_ov_influx_wc[s][row][col] = flux;
            }

            if options.ersovopt > 1 && newtaumax > state.tau_max_ov[row][col] {
                state.tau_max_ov[row][col] = newtaumax;
                state.tau_max_time_ov[row][col] = newtautime;
            }
        }
    }
}

//Erosion amount (g/m2) from the excess-shear relation. Non-cohesive
//classes erode whenever tau exceeds the critical value; cohesive
//classes only erode when tau also exceeds the largest shear the
//location has ever felt, and then only by the increment above what
//that historical maximum already removed.
fn excess_shear_amount(
    solid: &SolidsClass,
    tau: f64,
    taumax: f64,
    erodibility: f64,
    m_exponent: f64,
    newtaumax: &mut f64,
    newtautime: &mut f64,
    time: f64,
) -> f64 {
    if solid.cncopt == CNC_NONCOHESIVE {
        if tau > solid.tau_ce {
            erodibility / solid.zage * pow(tau / solid.tau_ce - 1.0, m_exponent)
        } else {
            0.0
        }
    } else if solid.cncopt == CNC_COHESIVE {
        if tau > solid.tau_ce && tau > taumax {
            //only the increment beyond what the historical maximum
            //already removed erodes now
            let prior = if taumax > solid.tau_ce {
                erodibility / solid.zage * pow(taumax / solid.tau_ce - 1.0, m_exponent)
            } else {
                0.0
            };
            let epsilon = erodibility / solid.zage * pow(tau / solid.tau_ce - 1.0, m_exponent) - prior;
            *newtaumax = tau;
            *newtautime = time;
            epsilon
        } else {
            0.0
        }
    } else {
        0.0
    }
}
