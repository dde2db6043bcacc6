pub use channel::channel_water_route;
pub use channel_depth::channel_water_depth;
pub use floodplain::floodplain_water_transfer;
pub use overland::overland_water_route;
pub use overland_depth::overland_water_depth;

pub mod channel;
pub mod channel_depth;
pub mod floodplain;
pub mod overland;
pub mod overland_depth;
