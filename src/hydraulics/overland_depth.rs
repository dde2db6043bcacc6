//Overland water depth integration on square cells.
//
//The overland portion of a cell is its full area minus the surface
//area of any channel running through it. The snowpack (as snow water
//equivalent) accumulates separately from the water column; melt is an
//external process.

use crate::constants::{DIR_BOUNDARY, DIR_POINT, TOLERANCE};
use crate::errors::{ErrorKind, SimulationError};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::state::State;

pub fn overland_water_depth(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
    dt: f64,
    time: f64,
) -> Result<(), SimulationError> {
    let w = grid.cell_size;

    for row in 0..grid.nrows {
        for col in 0..grid.ncols {
            if !grid.is_active(row, col) {
                continue;
            }

            //Overland surface area of the cell (m2)
            let achsurf = match grid.channel_at(row, col) {
                Some((l, j)) => network.links[l].nodes[j].surface_area(),
                None => 0.0,
            };
            let aovsurf = w * w - achsurf;
            if aovsurf <= 0.0 {
                //the channel occupies the whole cell
                state.h_ov_new[row][col] = state.h_ov[row][col];
                state.swe_ov_new[row][col] = state.swe_ov[row][col];
                continue;
            }

            //Volumetric derivative: net rain plus net routed flow
            let derivative = state.net_rain_rate[row][col] * aovsurf + state.dqov[row][col];

            let mut hovnew = state.h_ov[row][col] + derivative * dt / aovsurf;

            if hovnew < 0.0 {
                if hovnew.abs() < TOLERANCE {
                    hovnew = 0.0;
                } else {
                    return Err(SimulationError::new(
                        ErrorKind::NegativeDepth,
                        row,
                        col,
                        0,
                        &format!("new overland depth = {}", hovnew),
                    ));
                }
            }
            if hovnew < TOLERANCE {
                hovnew = 0.0;
            }
            state.h_ov_new[row][col] = hovnew;

            //Snowpack accumulates the net snowfall as swe
            if options.snowopt > 0 {
                state.swe_ov_new[row][col] = state.swe_ov[row][col] + state.net_swe_rate[row][col] * dt;
            } else {
                state.swe_ov_new[row][col] = state.swe_ov[row][col];
            }

            //=== cumulative mass balance variables ===

            state.gross_rain_vol[row][col] += state.gross_rain_rate[row][col] * (w * w) * dt;
            state.net_rain_vol[row][col] += state.net_rain_rate[row][col] * aovsurf * dt;
            if options.snowopt > 0 {
                state.net_swe_vol[row][col] += state.net_swe_rate[row][col] * aovsurf * dt;
            }

            for k in 1..=8usize {
                state.dqov_out_vol[row][col][k] += state.dqov_out[row][col][k] * dt;
                state.dqov_in_vol[row][col][k] += state.dqov_in[row][col][k] * dt;
            }
            state.dqov_out_vol[row][col][DIR_BOUNDARY] += state.dqov_out[row][col][DIR_BOUNDARY] * dt;
            state.dqov_in_vol[row][col][DIR_BOUNDARY] += state.dqov_in[row][col][DIR_BOUNDARY] * dt;
        }
    }

    //Point source volumes (direction 0)
    for source in forcing.qwov.iter() {
        let q = forcing.value(source.function);
        state.dqov_in_vol[source.row][source.col][DIR_POINT] += q * dt;
        state.qwov_vol[source.row][source.col] += q * dt;
    }

    //Peak overland flow at watershed outlets
    for k in 0..network.outlets.len() {
        if state.q_out_ov[k] > state.q_peak_ov[k] {
            state.q_peak_ov[k] = state.q_out_ov[k];
            state.t_peak_ov[k] = time;
        }
        state.q_out_ov_vol[k] += state.q_out_ov[k] * dt;
    }

    Ok(())
}
