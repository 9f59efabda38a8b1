pub mod engine;
pub mod error;
pub mod net;
pub mod scenario;
pub mod shaping;
pub mod sim;
pub mod topo;

pub use error::ExperimentError;

#[cfg(test)]
mod test;
