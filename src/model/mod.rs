pub mod environment;
pub mod facility;
pub mod order;
pub mod player;
pub mod rules;
pub mod snapshot;
pub mod unit;

pub use environment::*;
pub use facility::*;
pub use order::*;
pub use player::*;
pub use rules::*;
pub use snapshot::*;
pub use unit::*;
