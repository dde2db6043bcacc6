//Sediment transport capacity.
//
//Used by the capacity-limited erosion option: erosion makes up the
//difference between what the flow could carry and what it already
//carries. Overland capacity follows the modified Kilinc-Richardson
//relation with the soil K, cover C and practice P factors; channel
//capacity follows the Engelund-Hansen total load relation. Capacity
//for each solids class is apportioned by its mass fraction in the
//surface bed layer.

use libm::pow;

use crate::constants::{DENSITY_W, DIR_BOUNDARY, GAMMA_W, GRAV};
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::solids::SolidsClass;
use crate::state::State;

//Kilinc-Richardson lead coefficient (sediment flux per unit width)
const KR_COEFF: f64 = 25500.0;

pub fn overland_transport_capacity(grid: &Grid, state: &mut State, solids: &[SolidsClass]) {
    let w = grid.cell_size;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }

            //Friction slope magnitude from the cardinal components
            let sf = cell_friction_slope(state, row, col);

            //Unit discharge: total outflow per unit width (m2/s)
            let mut qsum = 0.0;
            for k in 1..=8usize {
                qsum += state.dqov_out[row][col][k];
            }
            qsum += state.dqov_out[row][col][DIR_BOUNDARY];
            let q_unit = qsum / w;

            //Total capacity per unit width (kg/m/s), then across the
            //cell width in g/s
            let qs = KR_COEFF * pow(q_unit, 2.035) * pow(sf, 1.664);
            let soil_factor =
                grid.kusle[row][col] * grid.cusle[row][col] * grid.pusle[row][col] / 0.15;
            let cap_total = qs * soil_factor * w * 1000.0;

            //Apportion by surface-layer grain fractions
            let top = state.nstack_ov[row][col] - 1;
            let total = surface_total(&state.conc_bed_ov, row, col, top, solids.len());
            for s in 0..solids.len() {
                let fraction = if total > 0.0 {
                    state.conc_bed_ov[s][row][col][top] / total
                } else {
                    0.0
                };
                state.transcap_ov[s][row][col] = cap_total * fraction;
            }
        }
    }
}

pub fn channel_transport_capacity(network: &ChannelNetwork, state: &mut State, solids: &[SolidsClass]) {
    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let hchan = state.h_ch[l][j];
            let sf = state.sf_ch[l][j].abs();

            let (area, wp) = node.conveyance_section(hchan, 0.0);
            let (velocity, tau) = if area > 0.0 && wp > 0.0 {
                let rh = area / wp;
                let velocity = sf.sqrt() / node.n_manning * pow(rh, 0.6667);
                (velocity, GAMMA_W * rh * sf)
            } else {
                (0.0, 0.0)
            };

            let top = state.nstack_ch[l][j] - 1;
            let total = surface_total(&state.conc_bed_ch, l, j, top, solids.len());

            for s in 0..solids.len() {
                let solid = &solids[s];
                let rho_s = solid.spgravity * DENSITY_W;
                let submerged = DENSITY_W * (solid.spgravity - 1.0) * GRAV * solid.diameter;
                if submerged <= 0.0 || tau <= 0.0 {
                    state.transcap_ch[s][l][j] = 0.0;
                    continue;
                }

                //dimensionless Shields number
                let theta = tau / submerged;

                //Engelund-Hansen total load per unit width (kg/m/s)
                let qs = 0.05
                    * rho_s
                    * velocity
                    * velocity
                    * (solid.diameter / (GRAV * (solid.spgravity - 1.0))).sqrt()
                    * pow(theta, 1.5);

                //capacity across the bed width in g/s
                let fraction = if total > 0.0 {
                    state.conc_bed_ch[s][l][j][top] / total
                } else {
                    0.0
                };
                state.transcap_ch[s][l][j] = qs * node.bottom_width * 1000.0 * fraction;
            }
        }
    }
}

//Magnitude of the overland friction-slope vector at a cell
pub fn cell_friction_slope(state: &State, row: usize, col: usize) -> f64 {
    let sf = &state.sf_ov[row][col];
    (sf[1] * sf[1] + sf[3] * sf[3] + sf[5] * sf[5] + sf[7] * sf[7]).sqrt()
}

//Total solids concentration of a surface layer, for grain fractions
fn surface_total(
    conc_bed: &[Vec<Vec<Vec<f64>>>],
    i: usize,
    j: usize,
    layer: usize,
    nsolids: usize,
) -> f64 {
    let mut total = 0.0;
    for s in 0..nsolids {
        total += conc_bed[s][i][j][layer];
    }
    total
}
