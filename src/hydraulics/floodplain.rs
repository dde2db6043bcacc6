//Intra-cell water transfer between the overland and channel portions
//of a channel cell (flow direction 9).
//
//With fldopt = 0 overland water above depression storage simply drains
//into the channel. With fldopt > 0 the transfer is bidirectional and
//driven by the water surface elevation difference: the volume moved is
//the volume that would equalise the two surfaces, limited by what the
//giving side holds (above depression storage overland, above the bank
//in the channel).

use crate::constants::DIR_FLOODPLAIN;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::state::State;

pub fn floodplain_water_transfer(
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

            let achsurf = node.surface_area();
            let aovsurf = w * w - achsurf;
            if aovsurf <= 0.0 {
                continue;
            }

            let stordep = grid.storage_depth[row][col];
            let hov = state.h_ov[row][col];
            let hch = state.h_ch[l][j];

            if options.fldopt == 0 {
                //One way: overland water above depression storage pours
                //into the channel regardless of surface elevations
                if hov > stordep {
                    let dq = (hov - stordep) * aovsurf / dt;
                    state.dqov[row][col] -= dq;
                    state.dqch[l][j] += dq;
                    state.dqov_out[row][col][DIR_FLOODPLAIN] = dq;
                    state.dqch_in[l][j][DIR_FLOODPLAIN] = dq;
                }
                continue;
            }

            //Bidirectional transfer by water surface elevation
            let wse_ov = grid.elevation[row][col] + hov;
            let wse_ch = node.bed_elevation + hch;

            if wse_ov > wse_ch && hov > stordep {
                //Overland to channel: move the equalising volume,
                //bounded by the water held above depression storage
                let dh = wse_ov - wse_ch;
                let veq = dh / (1.0 / aovsurf + 1.0 / achsurf);
                let vavail = (hov - stordep) * aovsurf;
                let dq = veq.min(vavail) / dt;
                state.dqov[row][col] -= dq;
                state.dqch[l][j] += dq;
                state.dqov_out[row][col][DIR_FLOODPLAIN] = dq;
                state.dqch_in[l][j][DIR_FLOODPLAIN] = dq;
            } else if wse_ch > wse_ov && hch > node.bank_height {
                //Channel to overland: only water above the bank can
                //leave the channel
                let dh = wse_ch - wse_ov;
                let veq = dh / (1.0 / aovsurf + 1.0 / achsurf);
                let vavail = (hch - node.bank_height) * achsurf;
                let dq = veq.min(vavail) / dt;
                state.dqch[l][j] -= dq;
                state.dqov[row][col] += dq;
                state.dqch_out[l][j][DIR_FLOODPLAIN] = dq;
                state.dqov_in[row][col][DIR_FLOODPLAIN] = dq;
            }
        }
    }
}
