use crate::constants::GAMMA_W;
use crate::grid::{CellType, Grid};
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::sediment::overland_solids_erosion;
use crate::solids::{SolidsClass, CNC_COHESIVE};
use crate::state::State;

//A single overland cell with a fully packed single-solid bed layer.
fn erodible_cell(porosity: f64, spgravity: f64) -> (Grid, ChannelNetwork, State, f64) {
    let mut grid = Grid::new(1, 1, 10.0);
    grid.mask[0][0] = CellType::Overland;
    grid.erodibility[0][0] = 1.0e-3; //ay (g/m2)
    grid.m_exponent[0][0] = 1.0;

    let network = ChannelNetwork::new();
    let mut state = State::new(&grid, &network, 1);

    //bed concentration of a pure deposit equals its bulk density in g/m3
    let bulk = spgravity * 1000.0 * (1.0 - porosity);
    let cbed = bulk * 1000.0;
    state.set_soil_stack(0, 0, vec![1.0], vec![porosity], 100.0, 0.0, 1.0e30, vec![vec![cbed]]);
    (grid, network, state, cbed)
}

//Drive the cell shear stress to an exact value through the friction
//slope component.
fn set_shear(state: &mut State, h: f64, tau: f64) {
    state.h_ov[0][0] = h;
    state.sf_ov[0][0] = [0.0; 11];
    state.sf_ov[0][0][3] = tau / (GAMMA_W * h);
}

#[test]
fn test_excess_shear_cohesive_memory() {
    let (grid, network, mut state, cbed) = erodible_cell(0.4, 2.65);
    let bulk = 2.65 * 1000.0 * 0.6;

    let mut solid = SolidsClass::new("clay");
    solid.cncopt = CNC_COHESIVE;
    solid.tau_ce = 0.5;
    solid.zage = 1.0;
    let solids = vec![solid];

    let mut options = ProcessOptions::new();
    options.ersovopt = 2;

    //tick 1: tau = 0.8 erodes the full excess and sets the history
    set_shear(&mut state, 0.1, 0.8);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 1.0);

    let eps1 = 1.0e-3 * (0.8 / 0.5 - 1.0);
    let expected1 = eps1 * 100.0 / (bulk * 1000.0) * cbed;
    assert!((state.ers_ov_outflux_bed[0][0][0] - expected1).abs() < expected1 * 1e-9);
    assert!((state.tau_max_ov[0][0] - 0.8).abs() < 1e-9);
    assert!((state.tau_max_time_ov[0][0] - 1.0).abs() < 1e-12);

    //tick 2: tau = 0.7 is below the historical maximum, nothing erodes
    state.reset_solids_fluxes();
    set_shear(&mut state, 0.1, 0.7);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 2.0);
    assert_eq!(state.ers_ov_outflux_bed[0][0][0], 0.0);
    assert!((state.tau_max_ov[0][0] - 0.8).abs() < 1e-9);

    //tick 3: tau = 1.0 erodes only the increment above the history
    state.reset_solids_fluxes();
    set_shear(&mut state, 0.1, 1.0);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 3.0);
    let eps3 = 1.0e-3 * ((1.0 / 0.5 - 1.0) - (0.8 / 0.5 - 1.0));
    let expected3 = eps3 * 100.0 / (bulk * 1000.0) * cbed;
    assert!((state.ers_ov_outflux_bed[0][0][0] - expected3).abs() < expected3 * 1e-6);
    assert!((state.tau_max_ov[0][0] - 1.0).abs() < 1e-9);
}

#[test]
fn test_noncohesive_erosion_has_no_memory() {
    let (grid, network, mut state, _cbed) = erodible_cell(0.4, 2.65);

    let mut solid = SolidsClass::new("sand");
    solid.tau_ce = 0.5;
    let solids = vec![solid];

    let mut options = ProcessOptions::new();
    options.ersovopt = 2;

    set_shear(&mut state, 0.1, 0.8);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 1.0);
    let first = state.ers_ov_outflux_bed[0][0][0];
    assert!(first > 0.0);

    //the same shear erodes the same amount again
    state.reset_solids_fluxes();
    set_shear(&mut state, 0.1, 0.8);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 2.0);
    assert!((state.ers_ov_outflux_bed[0][0][0] - first).abs() < first * 1e-12);
}

#[test]
fn test_below_critical_shear_no_erosion() {
    let (grid, network, mut state, _cbed) = erodible_cell(0.4, 2.65);

    let mut solid = SolidsClass::new("sand");
    solid.tau_ce = 0.5;
    let solids = vec![solid];

    let mut options = ProcessOptions::new();
    options.ersovopt = 2;

    set_shear(&mut state, 0.1, 0.4);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 1.0);
    assert_eq!(state.ers_ov_outflux_bed[0][0][0], 0.0);
}

#[test]
fn test_erosion_limited_by_bed_mass() {
    let (grid, network, mut state, cbed) = erodible_cell(0.4, 2.65);

    //shrink the surface layer to almost nothing
    state.vlayer_ov[0][0][0] = 1.0e-9;

    let mut solid = SolidsClass::new("sand");
    solid.tau_ce = 0.01;
    let solids = vec![solid];

    let mut options = ProcessOptions::new();
    options.ersovopt = 2;

    set_shear(&mut state, 0.5, 50.0);
    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 1.0);

    //the flux cannot exceed the mass held in the layer
    let available = 1.0e-9 * cbed;
    assert!(state.ers_ov_outflux_bed[0][0][0] * 1.0 <= available * (1.0 + 1e-9));
    assert!((state.ers_ov_outflux_bed[0][0][0] - available).abs() < available * 1e-6);
}

#[test]
fn test_capacity_limited_erosion_fills_the_deficit() {
    let (grid, network, mut state, cbed) = erodible_cell(0.4, 2.65);
    let bulk = 2.65 * 1000.0 * 0.6;

    let solids = vec![SolidsClass::new("sand")];
    let mut options = ProcessOptions::new();
    options.ersovopt = 1;

    //an empty water column: the whole capacity is unmet
    state.h_ov[0][0] = 0.1;
    state.transcap_ov[0][0][0] = 2.0; //g/s

    overland_solids_erosion(&grid, &network, &mut state, &solids, &options, 1.0, 1.0);

    //epsilon = cap * dt / abed, and the outflux re-scales it by the
    //bed concentration over the bulk density
    let eps = 2.0 * 1.0 / 100.0;
    let expected = eps * 100.0 / (bulk * 1000.0) * cbed;
    assert!((state.ers_ov_outflux_bed[0][0][0] - expected).abs() < expected * 1e-9);
    assert_eq!(state.transrate_ov[0][0][0], 0.0);
}
