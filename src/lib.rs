#[macro_use]
extern crate ini;

pub mod constants;
pub mod errors;
pub mod forcing;
pub mod grid;
pub mod hydraulics;
pub mod io;
pub mod mass_balance;
pub mod network;
pub mod numerical;
pub mod options;
pub mod reporting;
pub mod sediment;
pub mod simulation;
pub mod solids;
pub mod state;
pub mod tests;
