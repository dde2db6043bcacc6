//Explicit one-dimensional channel water routing using the diffusive
//wave approximation.
//
//Flow between nodes is driven by the friction slope (bed slope minus
//water surface slope) through Manning's equation on the trapezoidal
//conveyance section. Flow only occurs when the acting depth exceeds
//the dead storage depth plus the equivalent transmission loss depth,
//which prevents negative flows. Junctions push flow across links; a
//terminal node exchanges with the domain boundary under a normal-depth
//or specified-depth condition.

use libm::pow;

use crate::constants::{DIR_BOUNDARY, DIR_POINT};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::network::{ChannelNetwork, BC_NORMAL_DEPTH};
use crate::options::ProcessOptions;
use crate::state::State;

pub fn channel_water_route(
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
    dt: f64,
) {
    //Initialize channel flow arrays for use this time step (this also
    //resets the gross arrays for the floodplain transfer pass)
    state.reset_channel_flows();

    //Add external point flows...
    //
    //Note: sources (q > 0) bring flow to the node through direction 0.
    //A sink (q < 0) is carried as a negative source; the global
    //availability check happens in the depth integration.
    for source in forcing.qwch.iter() {
        let q = forcing.value(source.function);
        state.dqch[source.link][source.node] += q;
        state.dqch_in[source.link][source.node][DIR_POINT] += q;
    }

    //Route flows through the channel network
    for l in 0..network.links.len() {
        let link = &network.links[l];
        let n_nodes = link.n_nodes();

        //Route from the head of the link down to the node upstream of
        //the junction; the junction itself is handled separately.
        for j in 0..n_nodes - 1 {
            let node = &link.nodes[j];
            let down = &link.nodes[j + 1];

            //Bed slope from present to downstream node
            let so = (node.bed_elevation - down.bed_elevation) / node.length;

            //Water surface slope, dh/dx
            let dhdx = (state.h_ch[l][j + 1] - state.h_ch[l][j]) / node.length;

            //Friction slope (stored for sediment transport)
            let sf = so - dhdx;
            state.sf_ch[l][j] = sf;

            //Flow direction sign and acting depth: positive friction
            //slope sends flow downstream with the upstream depth
            let (a, hchan) = if sf >= 0.0 {
                (1.0, state.h_ch[l][j])
            } else {
                (-1.0, state.h_ch[l][j + 1])
            };

            let tloss = if options.ctlopt > 0 {
                node.transloss_rate * dt
            } else {
                0.0
            };

            let (dq, velocity) = if hchan > (node.dead_storage + tloss) && sf != 0.0 {
                let (area, wp) = node.conveyance_section(hchan, node.dead_storage);
                let rh = area / wp;
                let velocity = sf.abs().sqrt() / node.n_manning * pow(rh, 0.6667);
                (a * velocity * area, velocity)
            } else {
                (0.0, 0.0)
            };

            //Track the maximum Courant number across the network
            let courant = velocity * dt / node.length;
            if courant > state.max_courant_ch {
                state.max_courant_ch = courant;
            }

            //Transfer flow between the pair
            state.dqch[l][j] -= dq;
            state.dqch[l][j + 1] += dq;

            //Record gross flows by interface direction for the solids
            //transport bookkeeping
            let kdown = Grid::direction_between(node.row, node.col, down.row, down.col)
                .expect("validated topology");
            let kup = Grid::opposite(kdown);
            if a > 0.0 {
                state.dqch_out[l][j][kdown] = dq;
                state.dqch_in[l][j + 1][kup] = dq;
            } else {
                state.dqch_out[l][j + 1][kup] = dq.abs();
                state.dqch_in[l][j][kdown] = dq.abs();
            }
        }

        //Junction handling for the last node of the link
        let j = n_nodes - 1;
        let n_targets = link.n_down + if link.outlet.is_some() { 1 } else { 0 };

        if n_targets <= 1 {
            route_single_junction(network, state, forcing, options, l, j, dt);
        } else {
            route_diverging_junction(network, state, forcing, options, l, j, dt);
        }
    }
}

//Junction with a single downstream location: either the first node of
//one downstream link, or the domain boundary.
fn route_single_junction(
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
    l: usize,
    j: usize,
    dt: f64,
) {
    let link = &network.links[l];
    let node = &link.nodes[j];

    //Locate the downstream target
    let mut target: Option<(usize, usize, usize)> = None; //(link, node, direction)
    for dir in 1..=8usize {
        if let Some(m) = link.down_links[dir] {
            target = Some((m, 0, dir));
        }
    }

    let (downbed, dhdx, kdown) = match target {
        Some((m, n, dir)) => {
            let downbed = network.links[m].nodes[n].bed_elevation;
            let dhdx = (state.h_ch[m][n] - state.h_ch[l][j]) / node.length;
            (downbed, dhdx, dir)
        }
        None => {
            //Boundary: the virtual downstream bed elevation drops by
            //the outlet bed slope over one channel length
            let downbed = node.bed_elevation - link.bed_slope_out * node.length;
            let outlet = &network.outlets[link.outlet.expect("terminal link has outlet")];
            let dhdx = if outlet.bc_opt == BC_NORMAL_DEPTH {
                //normal depth: boundary depth equals present depth
                0.0
            } else {
                //specified water depth at the boundary
                (forcing.value_or_zero(outlet.hbc_function) - state.h_ch[l][j]) / node.length
            };
            (downbed, dhdx, DIR_BOUNDARY)
        }
    };

    let so = (node.bed_elevation - downbed) / node.length;
    let sf = so - dhdx;
    state.sf_ch[l][j] = sf;

    let (a, hchan) = if sf > 0.0 {
        (1.0, state.h_ch[l][j])
    } else if sf < 0.0 {
        let h = match target {
            Some((m, n, _)) => state.h_ch[m][n],
            //boundary depth assumed to equal the present node depth
            None => state.h_ch[l][j],
        };
        (-1.0, h)
    } else {
        (0.0, 0.0)
    };

    let tloss = if options.ctlopt > 0 {
        node.transloss_rate * dt
    } else {
        0.0
    };

    let dq = if hchan > (node.dead_storage + tloss) && sf != 0.0 {
        let (area, wp) = node.conveyance_section(hchan, node.dead_storage);
        let rh = area / wp;
        let velocity = sf.abs().sqrt() / node.n_manning * pow(rh, 0.6667);
        let courant = velocity * dt / node.length;
        if courant > state.max_courant_ch {
            state.max_courant_ch = courant;
        }
        a * velocity * area
    } else {
        0.0
    };

    //Take flow from the present node; give it to the target when the
    //target is inside the domain
    state.dqch[l][j] -= dq;
    if let Some((m, n, _)) = target {
        state.dqch[m][n] += dq;
    }

    //Gross flow bookkeeping
    if a > 0.0 {
        state.dqch_out[l][j][kdown] = dq;
        match target {
            Some((m, n, dir)) => {
                state.dqch_in[m][n][Grid::opposite(dir)] = dq;
            }
            None => {
                state.q_out_link[l] = dq;
            }
        }
    } else if a < 0.0 {
        match target {
            Some((m, n, dir)) => {
                state.dqch_out[m][n][Grid::opposite(dir)] = dq.abs();
            }
            None => {
                //reverse flow entering the domain from the boundary
                state.q_in_link[l] = dq.abs();
            }
        }
        state.dqch_in[l][j][kdown] = dq.abs();
    }
}

//Junction with diverging branches: each branch gets an independent
//friction slope, conveyance and flow potential. No redistribution is
//performed here; the concentration integrator applies the global
//availability check.
fn route_diverging_junction(
    network: &ChannelNetwork,
    state: &mut State,
    forcing: &Forcing,
    options: &ProcessOptions,
    l: usize,
    j: usize,
    dt: f64,
) {
    let link = &network.links[l];
    let node = &link.nodes[j];

    let tloss = if options.ctlopt > 0 {
        node.transloss_rate * dt
    } else {
        0.0
    };

    //Branch targets: the real downstream links, plus the boundary when
    //this link also serves an outlet
    for dir in 1..=8usize {
        let m = match link.down_links[dir] {
            Some(m) => m,
            None => continue,
        };
        let downbed = network.links[m].nodes[0].bed_elevation;
        let dhdx = (state.h_ch[m][0] - state.h_ch[l][j]) / node.length;
        let so = (node.bed_elevation - downbed) / node.length;
        let sf = so - dhdx;
        state.sf_ch[l][j] = sf;

        let (a, hchan) = if sf > 0.0 {
            (1.0, state.h_ch[l][j])
        } else if sf < 0.0 {
            (-1.0, state.h_ch[m][0])
        } else {
            (0.0, 0.0)
        };

        let dq = branch_flow(state, node, a, hchan, sf, tloss, dt);

        state.dqch[l][j] -= dq;
        state.dqch[m][0] += dq;

        let back = Grid::opposite(dir);
        if a > 0.0 {
            state.dqch_out[l][j][dir] = dq;
            state.dqch_in[m][0][back] = dq;
        } else if a < 0.0 {
            state.dqch_out[m][0][back] = dq.abs();
            state.dqch_in[l][j][dir] = dq.abs();
        }
    }

    if let Some(outlet_id) = link.outlet {
        let downbed = node.bed_elevation - link.bed_slope_out * node.length;
        let outlet = &network.outlets[outlet_id];
        let dhdx = if outlet.bc_opt == BC_NORMAL_DEPTH {
            0.0
        } else {
            (forcing.value_or_zero(outlet.hbc_function) - state.h_ch[l][j]) / node.length
        };
        let so = (node.bed_elevation - downbed) / node.length;
        let sf = so - dhdx;
        state.sf_ch[l][j] = sf;

        let (a, hchan) = if sf > 0.0 {
            (1.0, state.h_ch[l][j])
        } else if sf < 0.0 {
            (-1.0, state.h_ch[l][j])
        } else {
            (0.0, 0.0)
        };

        let dq = branch_flow(state, node, a, hchan, sf, tloss, dt);

        state.dqch[l][j] -= dq;
        if a > 0.0 {
            state.dqch_out[l][j][DIR_BOUNDARY] = dq;
            state.q_out_link[l] += dq;
        } else if a < 0.0 {
            state.q_in_link[l] += dq.abs();
            state.dqch_in[l][j][DIR_BOUNDARY] = dq.abs();
        }
    }
}

fn branch_flow(
    state: &mut State,
    node: &crate::network::ChannelNode,
    a: f64,
    hchan: f64,
    sf: f64,
    tloss: f64,
    dt: f64,
) -> f64 {
    if hchan > (node.dead_storage + tloss) && sf != 0.0 {
        let (area, wp) = node.conveyance_section(hchan, node.dead_storage);
        let rh = area / wp;
        let velocity = sf.abs().sqrt() / node.n_manning * pow(rh, 0.6667);
        let courant = velocity * dt / node.length;
        if courant > state.max_courant_ch {
            state.max_courant_ch = courant;
        }
        a * velocity * area
    } else {
        0.0
    }
}
