// Domain layer: sales records, derived aggregates and the ports the pipeline depends on.

pub mod model;
pub mod ports;
