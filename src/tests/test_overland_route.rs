use crate::forcing::Forcing;
use crate::grid::{CellType, Grid};
use crate::hydraulics::overland_water_route;
use crate::network::{ChannelNetwork, Outlet, BC_NORMAL_DEPTH};
use crate::state::State;

//An east-sloping strip of overland cells with an outlet at the east end.
fn sloped_strip(ncols: usize, slope: f64, n_manning: f64) -> (Grid, ChannelNetwork, State) {
    let w = 10.0;
    let mut grid = Grid::new(1, ncols, w);
    for col in 0..ncols {
        grid.mask[0][col] = CellType::Overland;
        grid.elevation[0][col] = (ncols - 1 - col) as f64 * slope * w;
        grid.n_manning[0][col] = n_manning;
    }

    let mut network = ChannelNetwork::new();
    network.outlets.push(Outlet {
        row: 0,
        col: ncols - 1,
        bc_opt: BC_NORMAL_DEPTH,
        hbc_function: None,
        bed_slope_ov: slope,
    });

    let state = State::new(&grid, &network, 1);
    (grid, network, state)
}

#[test]
fn test_flow_runs_down_the_slope() {
    let (grid, network, mut state) = sloped_strip(3, 0.01, 0.03);
    for col in 0..3 {
        state.h_ov[0][col] = 0.05;
    }
    let forcing = Forcing::new();

    overland_water_route(&grid, &network, &mut state, &forcing, 1.0);

    //uniform depth: the interface friction slope equals the bed slope,
    //recorded on the upwind cell's outflow direction only
    assert!((state.sf_ov[0][0][3] - 0.01).abs() < 1e-12);
    assert!((state.sf_ov[0][1][3] - 0.01).abs() < 1e-12);
    assert_eq!(state.sf_ov[0][1][7], 0.0);

    //expected Manning flow per interface
    let heff: f64 = 0.05;
    let v = 0.01_f64.sqrt() / 0.03 * heff.powf(0.6667);
    let dq = v * heff * 10.0;
    assert!((state.dqov_out[0][0][3] - dq).abs() < 1e-6);
    assert!((state.dqov_in[0][1][7] - dq).abs() < 1e-6);

    //boundary outflow at the outlet cell
    assert!((state.dqov_out[0][2][10] - dq).abs() < 1e-6);
    assert!((state.q_out_ov[0] - dq).abs() < 1e-6);

    //with uniform depth the interior cells pass flow through
    assert!(state.dqov[0][0] < 0.0);
    assert!(state.dqov[0][1].abs() < 1e-9);
    assert!((state.dqov[0][2] - 0.0).abs() < 1e-9);
}

#[test]
fn test_mass_conservation_of_routed_flows() {
    //the net flows over all cells must equal the boundary loss
    let (grid, network, mut state) = sloped_strip(5, 0.02, 0.05);
    state.h_ov[0][0] = 0.08;
    state.h_ov[0][1] = 0.02;
    state.h_ov[0][2] = 0.11;
    state.h_ov[0][3] = 0.0;
    state.h_ov[0][4] = 0.05;
    let forcing = Forcing::new();

    overland_water_route(&grid, &network, &mut state, &forcing, 1.0);

    let mut net = 0.0;
    for col in 0..5 {
        net += state.dqov[0][col];
    }
    assert!((net + state.q_out_ov[0]).abs() < 1e-12);
}

#[test]
fn test_depression_storage_withholds_flow() {
    let (mut grid, network, mut state) = sloped_strip(2, 0.01, 0.03);
    grid.storage_depth[0][0] = 0.05;
    grid.storage_depth[0][1] = 0.05;
    state.h_ov[0][0] = 0.05;
    state.h_ov[0][1] = 0.05;
    let forcing = Forcing::new();

    overland_water_route(&grid, &network, &mut state, &forcing, 1.0);

    //at the storage depth exactly, nothing moves
    assert_eq!(state.dqov[0][0], 0.0);
    assert_eq!(state.q_out_ov[0], 0.0);

    //just above, a small flow appears
    state.h_ov[0][0] = 0.05 + 1.0e-4;
    state.h_ov[0][1] = 0.05 + 1.0e-4;
    overland_water_route(&grid, &network, &mut state, &forcing, 1.0);
    assert!(state.dqov_out[0][0][3] > 0.0);
    assert!(state.dqov_out[0][0][3] < 1.0e-3);
}

#[test]
fn test_adverse_gradient_sends_flow_back() {
    //deeper water downstream overcomes the bed slope
    let (grid, network, mut state) = sloped_strip(2, 0.001, 0.03);
    state.h_ov[0][0] = 0.01;
    state.h_ov[0][1] = 0.5;
    let forcing = Forcing::new();

    overland_water_route(&grid, &network, &mut state, &forcing, 1.0);

    //flow runs west from the wetter cell
    assert!(state.dqov[0][0] > 0.0);
    assert!(state.dqov_out[0][1][7] > 0.0);
    assert!(state.dqov_in[0][0][3] > 0.0);
}
