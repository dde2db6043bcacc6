pub use advection::{channel_solids_advection, overland_solids_advection};
pub use capacity::{channel_transport_capacity, overland_transport_capacity};
pub use concentration::{channel_solids_concentration, overland_solids_concentration};
pub use deposition::{channel_solids_deposition, overland_solids_deposition};
pub use dispersion::{channel_solids_dispersion, overland_solids_dispersion};
pub use erosion::{channel_solids_erosion, overland_solids_erosion};
pub use floodplain::floodplain_solids_transfer;

pub mod advection;
pub mod capacity;
pub mod concentration;
pub mod deposition;
pub mod dispersion;
pub mod erosion;
pub mod floodplain;
