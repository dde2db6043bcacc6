use crate::forcing::{Forcing, NodeSource, TimeFunction};
use crate::grid::{CellType, Grid};
use crate::hydraulics::channel_water_route;
use crate::network::{ChannelNetwork, ChannelNode, Link, Outlet, BC_NORMAL_DEPTH, BC_SPECIFIED_DEPTH};
use crate::options::ProcessOptions;
use crate::state::State;

//Build a straight east-running link of n nodes with the outlet at the
//east end, a uniform bed slope, and rectangular geometry.
fn single_link(
    n: usize,
    bed_slope: f64,
    bw: f64,
    sslope: f64,
    hbank: f64,
    n_manning: f64,
    bed_slope_out: f64,
) -> (Grid, ChannelNetwork, State) {
    let w = 10.0;
    let mut grid = Grid::new(1, n, w);
    let mut link = Link::new();
    for col in 0..n {
        grid.mask[0][col] = CellType::Channel;
        grid.elevation[0][col] = (n - 1 - col) as f64 * bed_slope * w + hbank;

        let mut node = ChannelNode::new(0, col);
        node.bottom_width = bw;
        node.bank_height = hbank;
        node.side_slope = sslope;
        node.n_manning = n_manning;
        node.length = w;
        node.bed_elevation = grid.elevation[0][col] - hbank;
        link.nodes.push(node);
    }
    link.outlet = Some(0);
    link.bed_slope_out = bed_slope_out;

    let mut network = ChannelNetwork::new();
    network.links.push(link);
    network.outlets.push(Outlet {
        row: 0,
        col: n - 1,
        bc_opt: BC_NORMAL_DEPTH,
        hbc_function: None,
        bed_slope_ov: 0.0,
    });
    network.derive_topology(&mut grid).unwrap();

    let state = State::new(&grid, &network, 1);
    (grid, network, state)
}

#[test]
fn test_uniform_depth_flows_downstream() {
    let (_grid, network, mut state) = single_link(3, 0.01, 2.0, 0.0, 10.0, 0.05, 0.01);
    for j in 0..3 {
        state.h_ch[0][j] = 0.5;
    }
    let forcing = Forcing::new();
    let options = ProcessOptions::new();

    channel_water_route(&network, &mut state, &forcing, &options, 1.0);

    //uniform depth on a sloped bed: sf = so everywhere
    assert!((state.sf_ch[0][0] - 0.01).abs() < 1e-12);

    //expected Manning flow for the rectangular section
    let area = 2.0 * 0.5;
    let wp = 2.0 + 2.0 * 0.5;
    let rh: f64 = area / wp;
    let v = 0.01_f64.sqrt() / 0.05 * rh.powf(0.6667);
    let dq = v * area;

    assert!((state.dqch_out[0][0][3] - dq).abs() < 1e-6);
    assert!((state.dqch_in[0][1][7] - dq).abs() < 1e-6);

    //interior node passes the same flow through, so its net is zero
    assert!(state.dqch[0][0] < 0.0);
    assert!(state.dqch[0][1].abs() < 1e-9);

    //normal-depth outlet: the friction slope equals the outlet bed slope
    assert!((state.sf_ch[0][2] - 0.01).abs() < 1e-12);
    assert!((state.q_out_link[0] - dq).abs() < 1e-6);

    //courant number was tracked
    assert!(state.max_courant_ch > 0.0);
    assert!((state.max_courant_ch - v * 1.0 / 10.0).abs() < 1e-9);
}

#[test]
fn test_no_flow_on_flat_water() {
    //flat bed, flat water surface: both slopes are exactly zero
    let (_grid, network, mut state) = single_link(3, 0.0, 2.0, 0.0, 10.0, 0.05, 0.0);
    for j in 0..3 {
        state.h_ch[0][j] = 0.7;
    }
    let forcing = Forcing::new();
    let options = ProcessOptions::new();

    channel_water_route(&network, &mut state, &forcing, &options, 1.0);

    for j in 0..3 {
        assert_eq!(state.dqch[0][j], 0.0);
    }
    assert_eq!(state.q_out_link[0], 0.0);
    assert_eq!(state.q_in_link[0], 0.0);
}

#[test]
fn test_dead_storage_threshold() {
    let (_grid, mut network, mut state) = single_link(2, 0.01, 2.0, 0.0, 10.0, 0.05, 0.01);

    //exactly at the dead storage depth: no flow
    for j in 0..2 {
        network.links[0].nodes[j].dead_storage = 0.2;
        state.h_ch[0][j] = 0.2;
    }
    let forcing = Forcing::new();
    let options = ProcessOptions::new();
    channel_water_route(&network, &mut state, &forcing, &options, 1.0);
    assert_eq!(state.dqch[0][0], 0.0);

    //slightly above: a small positive flow
    for j in 0..2 {
        state.h_ch[0][j] = 0.2 + 1.0e-4;
    }
    channel_water_route(&network, &mut state, &forcing, &options, 1.0);
    assert!(state.dqch_out[0][0][3] > 0.0);
    assert!(state.dqch_out[0][0][3] < 1.0e-4);
}

#[test]
fn test_specified_depth_matching_node_gives_zero_boundary_flow() {
    //with dhdx cancelling the bed slope the boundary flow must vanish
    let (_grid, mut network, mut state) = single_link(2, 0.0, 2.0, 0.0, 10.0, 0.05, 0.01);
    let mut forcing = Forcing::new();

    //specified boundary depth equals the node depth plus the bed drop,
    //so sf = so - dhdx = 0.01 - 0.01 = 0... set hbc so that dhdx = so
    state.h_ch[0][0] = 0.5;
    state.h_ch[0][1] = 0.5;
    let hbc = 0.5 + 0.01 * 10.0;
    let f = forcing.add_function(TimeFunction::constant("hbc", hbc));
    network.outlets[0].bc_opt = BC_SPECIFIED_DEPTH;
    network.outlets[0].hbc_function = Some(f);
    forcing.advance_all(0.0).unwrap();

    let options = ProcessOptions::new();
    channel_water_route(&network, &mut state, &forcing, &options, 1.0);

    assert_eq!(state.q_out_link[0], 0.0);
    assert_eq!(state.q_in_link[0], 0.0);
    assert!(state.sf_ch[0][1].abs() < 1e-12);
}

#[test]
fn test_reverse_flow_from_boundary() {
    //a much higher specified boundary depth pushes water upstream
    let (_grid, mut network, mut state) = single_link(2, 0.0, 2.0, 0.0, 10.0, 0.05, 0.0);
    let mut forcing = Forcing::new();
    state.h_ch[0][0] = 0.1;
    state.h_ch[0][1] = 0.1;
    let f = forcing.add_function(TimeFunction::constant("hbc", 1.0));
    network.outlets[0].bc_opt = BC_SPECIFIED_DEPTH;
    network.outlets[0].hbc_function = Some(f);
    forcing.advance_all(0.0).unwrap();

    let options = ProcessOptions::new();
    channel_water_route(&network, &mut state, &forcing, &options, 1.0);

    //reverse flow enters the link from the boundary
    assert!(state.q_in_link[0] > 0.0);
    assert!(state.dqch_in[0][1][10] > 0.0);
    assert!(state.dqch[0][1] > 0.0);
    assert_eq!(state.q_out_link[0], 0.0);
}

#[test]
fn test_point_source_enters_direction_zero() {
    let (_grid, network, mut state) = single_link(2, 0.0, 2.0, 0.0, 10.0, 0.05, 0.0);
    let mut forcing = Forcing::new();
    let f = forcing.add_function(TimeFunction::constant("load", 0.25));
    forcing.qwch.push(NodeSource {
        link: 0,
        node: 0,
        function: f,
    });
    forcing.advance_all(0.0).unwrap();

    let options = ProcessOptions::new();
    channel_water_route(&network, &mut state, &forcing, &options, 1.0);

    assert!((state.dqch[0][0] - 0.25).abs() < 1e-12);
    assert!((state.dqch_in[0][0][0] - 0.25).abs() < 1e-12);
}
