//! Player-facing gameplay layer: inventory and the interaction controller
//! that sits on top of `physics` and `world` (spec §3 Player/Inventory,
//! §4.7).

pub mod controller;
pub mod inventory;

pub use controller::PlayerController;
pub use inventory::Inventory;
