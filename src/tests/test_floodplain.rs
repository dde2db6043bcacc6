use crate::constants::DIR_FLOODPLAIN;
use crate::grid::{CellType, Grid};
use crate::hydraulics::floodplain_water_transfer;
use crate::network::{ChannelNetwork, ChannelNode, Link, Outlet, BC_NORMAL_DEPTH};
use crate::options::ProcessOptions;
use crate::sediment::floodplain_solids_transfer;
use crate::state::State;

//A single channel cell: 10 x 10 m with a 2 m wide, 1 m deep channel
//running through it (surface area 20 m2, overland portion 80 m2).
fn channel_cell() -> (Grid, ChannelNetwork, State) {
    let w = 10.0;
    let mut grid = Grid::new(1, 1, w);
    grid.mask[0][0] = CellType::Channel;
    grid.elevation[0][0] = 1.0;

    let mut node = ChannelNode::new(0, 0);
    node.bottom_width = 2.0;
    node.bank_height = 1.0;
    node.side_slope = 0.0;
    node.length = w;
    node.bed_elevation = 0.0;

    let mut link = Link::new();
    link.nodes.push(node);
    link.outlet = Some(0);
    link.bed_slope_out = 0.01;

    let mut network = ChannelNetwork::new();
    network.links.push(link);
    network.outlets.push(Outlet {
        row: 0,
        col: 0,
        bc_opt: BC_NORMAL_DEPTH,
        hbc_function: None,
        bed_slope_ov: 0.0,
    });
    network.derive_topology(&mut grid).unwrap();

    let state = State::new(&grid, &network, 1);
    (grid, network, state)
}

#[test]
fn test_one_way_transfer_drains_overland_water() {
    let (grid, network, mut state) = channel_cell();
    state.h_ov[0][0] = 0.02;
    state.h_ch[0][0] = 0.1;

    let mut options = ProcessOptions::new();
    options.fldopt = 0;

    floodplain_water_transfer(&grid, &network, &mut state, &options, 1.0);

    //all overland water above depression storage moves in one step
    let expected = 0.02 * 80.0;
    assert!((state.dqov_out[0][0][DIR_FLOODPLAIN] - expected).abs() < 1e-12);
    assert!((state.dqch_in[0][0][DIR_FLOODPLAIN] - expected).abs() < 1e-12);
    assert!((state.dqov[0][0] + expected).abs() < 1e-12);
    assert!((state.dqch[0][0] - expected).abs() < 1e-12);

    //one-way mode never sends channel water out
    assert_eq!(state.dqch_out[0][0][DIR_FLOODPLAIN], 0.0);
}

#[test]
fn test_bidirectional_transfer_overland_to_channel() {
    let (grid, network, mut state) = channel_cell();
    //overland surface at 1.02 m, channel surface at 0.1 m
    state.h_ov[0][0] = 0.02;
    state.h_ch[0][0] = 0.1;

    let options = ProcessOptions::new(); //fldopt = 1

    floodplain_water_transfer(&grid, &network, &mut state, &options, 1.0);

    let dq = state.dqov_out[0][0][DIR_FLOODPLAIN];
    assert!(dq > 0.0);
    //no more than the water the overland portion holds
    assert!(dq <= 0.02 * 80.0 + 1e-12);
    assert_eq!(state.dqch_out[0][0][DIR_FLOODPLAIN], 0.0);
}

#[test]
fn test_bidirectional_transfer_floods_out_of_bank() {
    let (grid, network, mut state) = channel_cell();
    //channel surcharged far above the bank, dry floodplain
    state.h_ov[0][0] = 0.0;
    state.h_ch[0][0] = 1.5;

    let options = ProcessOptions::new();

    floodplain_water_transfer(&grid, &network, &mut state, &options, 1.0);

    let dq = state.dqch_out[0][0][DIR_FLOODPLAIN];
    assert!(dq > 0.0);
    //only water above the bank can leave the channel
    assert!(dq <= 0.5 * 20.0 + 1e-12);
    assert!((state.dqov_in[0][0][DIR_FLOODPLAIN] - dq).abs() < 1e-12);
    assert_eq!(state.dqov_out[0][0][DIR_FLOODPLAIN], 0.0);
}

#[test]
fn test_in_bank_channel_water_stays_put() {
    let (grid, network, mut state) = channel_cell();
    //channel below the bank and below the overland surface elevation,
    //but the floodplain is dry: nothing moves either way
    state.h_ov[0][0] = 0.0;
    state.h_ch[0][0] = 0.5;

    let options = ProcessOptions::new();

    floodplain_water_transfer(&grid, &network, &mut state, &options, 1.0);

    assert_eq!(state.dqov_out[0][0][DIR_FLOODPLAIN], 0.0);
    assert_eq!(state.dqch_out[0][0][DIR_FLOODPLAIN], 0.0);
}

#[test]
fn test_solids_follow_the_water_upwind() {
    let (grid, network, mut state) = channel_cell();
    state.h_ov[0][0] = 0.02;
    state.h_ch[0][0] = 0.1;
    state.conc_ov[0][0][0] = 100.0;
    state.conc_ch[0][0][0] = 7.0;

    //water moves overland -> channel
    state.dqov_out[0][0][DIR_FLOODPLAIN] = 0.5;
    state.dqch_in[0][0][DIR_FLOODPLAIN] = 0.5;

    let options = ProcessOptions::new();
    floodplain_solids_transfer(&grid, &network, &mut state, &options, 1.0);

    //the transfer carries the overland (upwind) concentration
    assert!((state.adv_ov_outflux[0][0][0][DIR_FLOODPLAIN] - 0.5 * 100.0).abs() < 1e-9);
    assert!((state.adv_ch_influx[0][0][0][DIR_FLOODPLAIN] - 0.5 * 100.0).abs() < 1e-9);
    //nothing flows the other way
    assert_eq!(state.adv_ch_outflux[0][0][0][DIR_FLOODPLAIN], 0.0);
}

#[test]
fn test_solids_transfer_respects_committed_sinks() {
    let (grid, network, mut state) = channel_cell();
    state.h_ov[0][0] = 0.01; //0.8 m3 of overland water
    state.conc_ov[0][0][0] = 10.0; //8 g available

    //the floodplain flow alone would carry 10 g/s
    state.dqov_out[0][0][DIR_FLOODPLAIN] = 1.0;
    state.dqch_in[0][0][DIR_FLOODPLAIN] = 1.0;

    //another 6 g/s is already committed eastward
    state.adv_ov_outflux[0][0][0][3] = 6.0;

    let options = ProcessOptions::new();
    floodplain_solids_transfer(&grid, &network, &mut state, &options, 1.0);

    //only 8 - 6 = 2 g remain for the floodplain over this step
    assert!((state.adv_ov_outflux[0][0][0][DIR_FLOODPLAIN] - 2.0).abs() < 1e-9);
}
