//Floodplain solids transfer (flow direction 9).
//
//Uses the direction-9 water flows with upwind concentrations: flow
//from the overland portion carries the overland concentration, flow
//from the channel carries the channel concentration. Each side is then
//scaled against the mass still available after the sinks already
//committed this step (point sinks, the cardinal interfaces, the
//boundary, and deposition), so the transfer cannot double-count mass.

use crate::constants::DIR_FLOODPLAIN;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::state::State;

//Sinks competing with the floodplain transfer
const COMMITTED_DIRS: [usize; 6] = [0, 1, 3, 5, 7, 10];

pub fn floodplain_solids_transfer(
    grid: &Grid,
    network: &ChannelNetwork,
    state: &mut State,
    options: &ProcessOptions,
    dt: f64,
) {
    let w = grid.cell_size;

    for l in 0..network.links.len() {
        for j in 0..network.links[l].n_nodes() {
            let node = &network.links[l].nodes[j];
            let (row, col) = (node.row, node.col);

            //Water column volumes on both sides of the cell
            let achsurf = node.surface_area();
            let aovsurf = w * w - achsurf;
            let watervolov = state.h_ov[row][col] * aovsurf;
            let watervolch = node.storage_volume(state.h_ch[l][j]);

            //Floodplain flows: flows leaving the overland portion are
            //scaled by the overland factor, flows leaving the channel
            //by the channel factor
            let inflowov = state.dqov_in[row][col][DIR_FLOODPLAIN] * options.advchscale;
            let outflowov = state.dqov_out[row][col][DIR_FLOODPLAIN] * options.advovscale;
            let inflowch = state.dqch_in[l][j][DIR_FLOODPLAIN] * options.advovscale;
            let outflowch = state.dqch_out[l][j][DIR_FLOODPLAIN] * options.advchscale;

            for s in 0..state.nsolids {
                //Upwind fluxes (g/s)
                state.adv_ov_influx[s][row][col][DIR_FLOODPLAIN] = inflowov * state.conc_ch[s][l][j];
                state.adv_ov_outflux[s][row][col][DIR_FLOODPLAIN] =
                    outflowov * state.conc_ov[s][row][col];
                state.adv_ch_influx[s][l][j][DIR_FLOODPLAIN] = inflowch * state.conc_ov[s][row][col];
                state.adv_ch_outflux[s][l][j][DIR_FLOODPLAIN] = outflowch * state.conc_ch[s][l][j];

                //Overland side: scale against what is left after the
                //committed sinks
                let potential = state.adv_ov_outflux[s][row][col][DIR_FLOODPLAIN] * dt;
                let mut outflux = 0.0;
                for k in COMMITTED_DIRS {
                    outflux += state.adv_ov_outflux[s][row][col][k];
                }
                let mut available = state.conc_ov[s][row][col] * watervolov
                    - (state.dep_ov_outflux_wc[s][row][col] + outflux) * dt;
                if available < 0.0 {
                    available = 0.0;
                }
                if potential > available {
                    state.adv_ov_outflux[s][row][col][DIR_FLOODPLAIN] =
                        available / potential * state.adv_ov_outflux[s][row][col][DIR_FLOODPLAIN];
                }

                //Channel side: same check against the channel column
                let potential = state.adv_ch_outflux[s][l][j][DIR_FLOODPLAIN] * dt;
                let mut outflux = 0.0;
                for k in COMMITTED_DIRS {
                    outflux += state.adv_ch_outflux[s][l][j][k];
                }
                let mut available = state.conc_ch[s][l][j] * watervolch
                    - (state.dep_ch_outflux_wc[s][l][j] + outflux) * dt;
                if available < 0.0 {
                    available = 0.0;
                }
                if potential > available {
                    state.adv_ch_outflux[s][l][j][DIR_FLOODPLAIN] =
                        available / potential * state.adv_ch_outflux[s][l][j][DIR_FLOODPLAIN];
                }
            }
        }
    }
}
