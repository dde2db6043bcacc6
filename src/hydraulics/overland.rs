//Explicit overland water routing using the diffusive wave
//approximation on the raster.
//
//Each active cell exchanges flow with its cardinal neighbours through
//the N/E/S/W interfaces; the friction slope at each interface is kept
//per direction so the solids kernels can form the cell shear-stress
//vector. Designated outlet cells exchange with the domain boundary
//through direction 10.

use libm::pow;

use crate::constants::{DIR_BOUNDARY, DIR_E, DIR_POINT, DIR_S};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::{ChannelNetwork, BC_NORMAL_DEPTH};
use crate::state::State;

pub fn overland_water_route(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    dt: f64,
) {
    //Initialize overland flow arrays for use this time step
    state.reset_overland_flows();

    //Add external point flows (sources enter through direction 0)
    for source in forcing.qwov.iter() {
        let q = forcing.value(source.function);
        state.dqov[source.row][source.col] += q;
        state.dqov_in[source.row][source.col][DIR_POINT] += q;
    }

    let w = grid.cell_size;

    //Route flow across the east and south interface of every cell so
    //each interior interface is visited exactly once
    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }
            for dir in [DIR_E, DIR_S] {
                let (nrow, ncol) = match grid.neighbour(row, col, dir) {
                    Some(cell) => cell,
                    None => continue,
                };

                //Bed slope and water surface slope across the interface
                let so = (grid.elevation[row][col] - grid.elevation[nrow][ncol]) / w;
                let dhdx = (state.h_ov[nrow][ncol] - state.h_ov[row][col]) / w;
                let sf = so - dhdx;

                //Acting cell is the upgradient one; the interface
                //friction slope is recorded on its outflow direction,
                //so at most one of each E/W and N/S component pair is
                //non-zero when the shear-stress vector is formed
                let back = Grid::opposite(dir);
                let (a, arow, acol) = if sf >= 0.0 {
                    state.sf_ov[row][col][dir] = sf;
                    (1.0, row, col)
                } else {
                    state.sf_ov[nrow][ncol][back] = -sf;
                    (-1.0, nrow, ncol)
                };

                let hcell = state.h_ov[arow][acol];
                let stordep = grid.storage_depth[arow][acol];

                let dq = if hcell > stordep && sf != 0.0 {
                    let heff = hcell - stordep;
                    let velocity = sf.abs().sqrt() / grid.n_manning[arow][acol] * pow(heff, 0.6667);
                    let courant = velocity * dt / w;
                    if courant > state.max_courant_ov {
                        state.max_courant_ov = courant;
                    }
                    a * velocity * heff * w
                } else {
                    0.0
                };

                state.dqov[row][col] -= dq;
                state.dqov[nrow][ncol] += dq;

                if a > 0.0 {
                    state.dqov_out[row][col][dir] = dq;
                    state.dqov_in[nrow][ncol][back] = dq;
                } else {
                    state.dqov_out[nrow][ncol][back] = dq.abs();
                    state.dqov_in[row][col][dir] = dq.abs();
                }
            }
        }
    }

    //Boundary flow at designated outlet cells
    for k in 0..network.outlets.len() {
        let outlet = &network.outlets[k];
        let (row, col) = (outlet.row, outlet.col);
        if !grid.is_active(row, col) {
            continue;
        }

        let so = outlet.bed_slope_ov;
        let hbc = forcing.value_or_zero(outlet.hbc_function);
        let dhdx = if outlet.bc_opt == BC_NORMAL_DEPTH {
            0.0
        } else {
            (hbc - state.h_ov[row][col]) / w
        };
        let sf = so - dhdx;

        //Acting depth: the cell depth leaving, the boundary depth on
        //reverse flow under a specified-depth condition
        let (a, hcell) = if sf > 0.0 {
            (1.0, state.h_ov[row][col])
        } else if sf < 0.0 {
            (-1.0, hbc)
        } else {
            (0.0, 0.0)
        };

        let stordep = grid.storage_depth[row][col];
        let dq = if hcell > stordep && sf != 0.0 {
            let heff = hcell - stordep;
            let velocity = sf.abs().sqrt() / grid.n_manning[row][col] * pow(heff, 0.6667);
            let courant = velocity * dt / w;
            if courant > state.max_courant_ov {
                state.max_courant_ov = courant;
            }
            a * velocity * heff * w
        } else {
            0.0
        };

        state.dqov[row][col] -= dq;
        if a > 0.0 {
            state.dqov_out[row][col][DIR_BOUNDARY] = dq;
            state.q_out_ov[k] = dq;
        } else if a < 0.0 {
            state.dqov_in[row][col][DIR_BOUNDARY] = dq.abs();
        }
    }
}
