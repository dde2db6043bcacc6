//Solids deposition fluxes.
//
//The effective settling flow is ws * pdep * A, where pdep is the
//probability that a settling particle stays on the bed:
//
//  option 1: pdep = 1 (all particles stay);
//
//  option >= 2, non-cohesive: Gessler's formulation, where the
//  critical shear for deposition is the stress above which half the
//  particles of the size settle;
//
//  option >= 2, cohesive: Partheniades' formulation, where the
//  critical shear is the stress above which all particles settle.
//
//Both formulations evaluate a normal-distribution tail with the
//Abramowitz and Stegun approximation. The settling flow is limited so
//the mass leaving the water column never exceeds what it holds.

use libm::{exp, log};

use crate::constants::GAMMA_W;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::numerical::mathfn::normal_tail;
use crate::options::ProcessOptions;
use crate::sediment::capacity::cell_friction_slope;
use crate::solids::{SolidsClass, CNC_COHESIVE, CNC_NONCOHESIVE};
use crate::state::State;

pub fn channel_solids_deposition(
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    options: &ProcessOptions,
    dt: f64,
) {
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let hchan = state.h_ch[l][j];

            let (area, wp) = node.conveyance_section(hchan, 0.0);
            let rh = if wp > 0.0 { area / wp } else { 0.0 };
            let sf = state.sf_ch[l][j].abs();
            let tau = GAMMA_W * rh * sf;

            let watervol = area * node.length;
            let asurf = node.surface_area();

            for s in 0..solids.len() {
                let pdep = if options.depchopt > 1 {
                    deposition_probability(&solids[s], tau)
                } else {
                    1.0
                };

                //effective deposition flow (m3/s), scaled
                let mut depflow = solids[s].ws * pdep * asurf;
                depflow *= options.depchscale;

                //limit to the mass held in the water column
                let potential = depflow * state.conc_ch[s][l][j] * dt;
                let available = state.conc_ch[s][l][j] * watervol;
                if potential > available {
                    depflow = available / potential * depflow;
                }
                state.dep_flow_ch[s][l][j] = depflow;

                //outflux from the water column and matching influx to
                //the surface bed layer (g/s)
                let flux = depflow * state.conc_ch[s][l][j];
                state.dep_ch_outflux_wc[s][l][j] = flux;
                state.dep_ch_influx_bed[s][l][j] = flux;
            }
        }
    }
}

pub fn overland_solids_deposition(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    solids: &[SolidsClass],
    options: &ProcessOptions,
    dt: f64,
) {
    let w = grid.cell_size;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }

            let sf = cell_friction_slope(state, row, col);
            let tau = GAMMA_W * state.h_ov[row][col] * sf;

            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            let aovsurf = w * w - achsurf;
            let watervol = state.h_ov[row][col] * aovsurf;

            for s in 0..solids.len() {
                let pdep = if options.depovopt > 1 {
                    deposition_probability(&solids[s], tau)
                } else {
                    1.0
                };

                let mut depflow = solids[s].ws * pdep * aovsurf;
                depflow *= options.depovscale;

                let potential = depflow * state.conc_ov[s][row][col] * dt;
                let available = state.conc_ov[s][row][col] * watervol;
                if potential > available {
                    depflow = available / potential * depflow;
                }
                state.dep_flow_ov[s][row][col] = depflow;

                let flux = depflow * state.conc_ov[s][row][col];
                state.dep_ov_outflux_wc[s][row][col] = flux;
                state.dep_ov_influx_bed[s][row][col] = flux;
            }
        }
    }
}

//Probability that a settling particle stays on the bed.
pub fn deposition_probability(solid: &SolidsClass, tau: f64) -> f64 {
    if solid.cncopt == CNC_COHESIVE {
        //Partheniades (cohesive)
        let sigma = 0.49;
        if tau <= solid.tau_cd {
            return 1.0;
        }
        let yy = (1.0 / sigma) * log(0.25 * (tau / solid.tau_cd - 1.0) * exp(1.27 * solid.tau_cd));
        if yy < 0.0 {
            //lower half of the distribution: probability of staying
            normal_tail(yy.abs())
        } else {
            //upper half: the tail is the probability of not staying
            1.0 - normal_tail(yy)
        }
    } else if solid.cncopt == CNC_NONCOHESIVE {
        //Gessler (non-cohesive)
        let sigma = 0.57;
        if tau <= 0.0 {
            return 1.0;
        }
        let yy = (1.0 / sigma) * (solid.tau_cd / tau - 1.0);
        if yy >= 0.0 {
            //tau at or below critical: upper half, probability of staying
            normal_tail(yy)
        } else {
            //tau above critical: the tail is the probability of not
            //staying, so staying is its complement
            1.0 - normal_tail(yy.abs())
        }
    } else {
        1.0
    }
}
