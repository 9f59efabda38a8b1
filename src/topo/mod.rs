//! 拓扑构建

pub mod parking_lot;

pub use parking_lot::{ParkingLot, ParkingLotOpts, build_parking_lot};
