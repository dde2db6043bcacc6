//Physical constants and shared numerical thresholds.

//Density of water (kg/m3)
pub const DENSITY_W: f64 = 1000.0;

//Gravitational acceleration (m/s2)
pub const GRAV: f64 = 9.81;

//Unit weight of water (N/m3)
pub const GAMMA_W: f64 = DENSITY_W * GRAV;

//Threshold separating round-off from genuine numerical instability.
//The same value governs depths (m), volumes (m3) and masses (g).
pub const TOLERANCE: f64 = 1.0e-9;

//Flow source/direction indices.
//
//  0    = point source/sink (external load)
//  1..8 = neighbouring cells / channel branches (1=N, 3=E, 5=S, 7=W,
//         even numbers are the diagonals NE/SE/SW/NW)
//  9    = intra-cell floodplain transfer
//  10   = domain boundary at an outlet
pub const DIR_POINT: usize = 0;
pub const DIR_N: usize = 1;
pub const DIR_E: usize = 3;
pub const DIR_S: usize = 5;
pub const DIR_W: usize = 7;
pub const DIR_FLOODPLAIN: usize = 9;
pub const DIR_BOUNDARY: usize = 10;

//Number of addressable flow directions (0..=10)
pub const NDIRS: usize = 11;

//Sentinel time used to pad forcing functions past the end of any
//simulation, so that a query can never wrap back to the first pair.
pub const SENTINEL_TIME: f64 = 1.0e30;
