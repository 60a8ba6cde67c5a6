pub mod command;
pub mod commandpipeline;
pub mod conditional;

pub use command::*;
pub use commandpipeline::*;
pub use conditional::*;
