pub mod classifier;
pub mod decorator;
pub mod detectors;
pub mod evaluator;
pub mod factory;
pub mod policy;
pub mod shutdown;

#[cfg(test)]
mod detectors_tests;

pub use classifier::*;
pub use decorator::*;
pub use detectors::{
    detect_all, detect_with, AlertKind, BoundaryPolicy, Bounds, Detector, DetectorConfig, RawTrigger,
    DETECTORS,
};
pub use evaluator::*;
pub use factory::*;
pub use policy::*;
pub use shutdown::*;
