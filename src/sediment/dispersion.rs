//Dispersive solids fluxes.
//
//Dispersion moves solids down the concentration gradient across each
//wetted interface: flux = D * dC/dx * A, with the same per-direction
//bookkeeping as advection so the integrator can scale all sinks
//together. Each interface is visited once from its upstream side.

use crate::constants::{DIR_BOUNDARY, DIR_E, DIR_S};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::state::State;

pub fn channel_solids_dispersion(
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
) {
    let d_coeff = options.dspchcoeff;
    if d_coeff <= 0.0 {
        return;
    }

    for s in 0..state.nsolids {
        for l in 0..network.links.len() {
            let link = &network.links[l];
            for j in 0..link.n_nodes() {
                let node = &link.nodes[j];

                //Mean depth across the interface sets the exchange area
                for k in 1..=8usize {
                    let (ml, mj) = match node.neighbour[k] {
                        Some(t) => t,
                        None => continue,
                    };
                    //visit each interface from one side only: skip the
                    //side that sees its partner upstream of itself
                    if (ml, mj) < (l, j) {
                        continue;
                    }
                    let hmean = 0.5 * (state.h_ch[l][j] + state.h_ch[ml][mj]);
                    if hmean <= 0.0 {
                        continue;
                    }
                    let area = node.storage_cross_section(hmean);
                    let flux = d_coeff * (state.conc_ch[s][l][j] - state.conc_ch[s][ml][mj])
                        / node.length
                        * area;
                    let back = Grid::opposite(k);
                    if flux > 0.0 {
                        state.dsp_ch_outflux[s][l][j][k] += flux;
                        state.dsp_ch_influx[s][ml][mj][back] += flux;
                    } else if flux < 0.0 {
                        state.dsp_ch_outflux[s][ml][mj][back] += flux.abs();
                        state.dsp_ch_influx[s][l][j][k] += flux.abs();
                    }
                }
            }

            //Boundary interface of an outlet link disperses against the
            //boundary concentration
            if let Some(outlet_id) = link.outlet {
                let j = link.last_node();
                let node = &link.nodes[j];
                let h = state.h_ch[l][j];
                if h <= 0.0 {
                    continue;
                }
                let cbc = forcing.value_or_zero(forcing.cbc[outlet_id][s]);
                let area = node.storage_cross_section(h);
                let flux = d_coeff * (state.conc_ch[s][l][j] - cbc) / node.length * area;
                if flux > 0.0 {
                    state.dsp_ch_outflux[s][l][j][DIR_BOUNDARY] += flux;
                } else if flux < 0.0 {
                    state.dsp_ch_influx[s][l][j][DIR_BOUNDARY] += flux.abs();
                }
            }
        }
    }
}

pub fn overland_solids_dispersion(grid: &Grid, state: &mut State, options: &ProcessOptions) {
    let d_coeff = options.dspovcoeff;
    if d_coeff <= 0.0 {
        return;
    }

    let w = grid.cell_size;

    for s in 0..state.nsolids {
        for row in 0..grid.nrows {
            for col in 0..grid.ncols {
                if !grid.is_active(row, col) {
                    continue;
                }
                for dir in [DIR_E, DIR_S] {
                    let (nr, nc) = match grid.neighbour(row, col, dir) {
                        Some(cell) => cell,
                        None => continue,
                    };
                    let hmean = 0.5 * (state.h_ov[row][col] + state.h_ov[nr][nc]);
                    if hmean <= 0.0 {
                        continue;
                    }
                    let area = hmean * w;
                    let flux =
                        d_coeff * (state.conc_ov[s][row][col] - state.conc_ov[s][nr][nc]) / w * area;
                    let back = Grid::opposite(dir);
                    if flux > 0.0 {
                        state.dsp_ov_outflux[s][row][col][dir] += flux;
                        state.dsp_ov_influx[s][nr][nc][back] += flux;
                    } else if flux < 0.0 {
                        state.dsp_ov_outflux[s][nr][nc][back] += flux.abs();
                        state.dsp_ov_influx[s][row][col][dir] += flux.abs();
                    }
                }
            }
        }
    }
}
