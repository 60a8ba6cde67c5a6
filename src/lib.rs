#![warn(clippy::all)]

pub mod board;
pub mod features;
pub mod geometry;
pub mod logging;
pub mod maneuver;
pub mod military;
pub mod model;
pub mod pipeline;
pub mod production;
pub mod strategy;
pub mod visualization;

pub use features::Features;
pub use model::{GameRules, Order, TickSnapshot};
pub use strategy::TacticalController;
pub use visualization::TacticalSummary;
